//! Command handlers: resolve input, call the API, print the result.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use studysyncapp::api::StudyApi;
use studysyncapp::config::StudyConfig;
use studysyncapp::error::SyncError;
use studysyncapp::model::{
    Draft, Flashcard, FlashcardDeck, NoteContent, Question, QuizContent, Record, RecordKind,
};
use studysyncapp::notify::{LogNotifier, Notice, NoticeLevel, Notifier};
use studysyncapp::scoring::timer::{handle_time_change, TimeUnit};
use studysyncapp::store::{CollectionStore, FsBackend};

use super::render::{self, RenderPayload};
use super::setup::{
    CollectionCommands, Commands, ContentArgs, ForumCommands, MiscCommands, Visibility,
    VoteTarget,
};

/// Prints notices to stderr. Errors are left to `main`, which prints them once.
/// In quiet (JSON) mode notices only reach the log.
pub struct TerminalNotifier {
    quiet: bool,
}

impl TerminalNotifier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        if notice.level == NoticeLevel::Error {
            return;
        }
        if self.quiet {
            LogNotifier.notify(notice);
            return;
        }
        eprintln!("{}", render::render_notice(&notice));
    }
}

pub struct CliContext {
    pub api: StudyApi<FsBackend>,
    pub config: StudyConfig,
    pub json: bool,
}

impl CliContext {
    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Library errors carry a technical `Display`; the user sees the notice text.
fn user_facing(e: SyncError) -> anyhow::Error {
    tracing::debug!("{:?}", e);
    anyhow!(e.user_message())
}

pub async fn dispatch(ctx: &CliContext, command: Commands) -> Result<()> {
    match command {
        Commands::Collection(cmd) => collection(ctx, cmd).await,
        Commands::Forum(cmd) => forum(ctx, cmd).await,
        Commands::Misc(cmd) => misc(ctx, cmd).await,
    }
}

async fn collection(ctx: &CliContext, cmd: CollectionCommands) -> Result<()> {
    match cmd {
        CollectionCommands::List { kind } => match RecordKind::from(kind) {
            RecordKind::Note => list(ctx, ctx.api.notes()),
            RecordKind::Flashcard => list(ctx, ctx.api.flashcards()),
            RecordKind::Quiz => list(ctx, ctx.api.quizzes()),
        },
        CollectionCommands::Show { kind, id } => match RecordKind::from(kind) {
            RecordKind::Note => show(ctx, ctx.api.notes(), &id),
            RecordKind::Flashcard => show(ctx, ctx.api.flashcards(), &id),
            RecordKind::Quiz => show(ctx, ctx.api.quizzes(), &id),
        },
        CollectionCommands::Create {
            kind,
            title,
            content,
        } => {
            let title = title.join(" ");
            match RecordKind::from(kind) {
                RecordKind::Note => create(ctx, ctx.api.notes(), &title, &content).await,
                RecordKind::Flashcard => {
                    create(ctx, ctx.api.flashcards(), &title, &content).await
                }
                RecordKind::Quiz => create(ctx, ctx.api.quizzes(), &title, &content).await,
            }
        }
        CollectionCommands::Update {
            kind,
            id,
            title,
            content,
        } => {
            let title = Some(title.join(" ")).filter(|t| !t.trim().is_empty());
            match RecordKind::from(kind) {
                RecordKind::Note => update(ctx, ctx.api.notes(), &id, title, &content).await,
                RecordKind::Flashcard => {
                    update(ctx, ctx.api.flashcards(), &id, title, &content).await
                }
                RecordKind::Quiz => update(ctx, ctx.api.quizzes(), &id, title, &content).await,
            }
        }
        CollectionCommands::Delete { kind, id } => {
            let result = match RecordKind::from(kind) {
                RecordKind::Note => ctx.api.notes().delete(&id).await,
                RecordKind::Flashcard => ctx.api.flashcards().delete(&id).await,
                RecordKind::Quiz => ctx.api.quizzes().delete(&id).await,
            };
            result.map_err(user_facing)
        }
        CollectionCommands::Visibility { kind, id, state } => {
            let public = state == Visibility::Public;
            let result = match RecordKind::from(kind) {
                RecordKind::Note => ctx.api.notes().toggle_visibility(&id, public).await,
                RecordKind::Flashcard => ctx.api.flashcards().toggle_visibility(&id, public).await,
                RecordKind::Quiz => ctx.api.quizzes().toggle_visibility(&id, public).await,
            };
            result.map_err(user_facing)
        }
        CollectionCommands::Score { quiz_id, answers } => {
            let selections = answers
                .iter()
                .map(|a| parse_selection(a))
                .collect::<Result<Vec<_>>>()?;
            let result = ctx
                .api
                .score_quiz(&quiz_id, &selections)
                .map_err(user_facing)?;
            if ctx.json {
                return ctx.print_json(&result);
            }
            print!("{}", render::render_score(&result));
            Ok(())
        }
    }
}

fn list<P: RenderPayload>(ctx: &CliContext, store: &CollectionStore<P, FsBackend>) -> Result<()> {
    if ctx.json {
        return store.with_records(|records| ctx.print_json(&records));
    }
    print!("{}", store.with_records(|records| render::render_list(records)));
    Ok(())
}

fn show<P: RenderPayload>(
    ctx: &CliContext,
    store: &CollectionStore<P, FsBackend>,
    id: &str,
) -> Result<()> {
    let record = store
        .get(id)
        .ok_or_else(|| user_facing(SyncError::RecordNotFound(id.to_string())))?;
    if ctx.json {
        return ctx.print_json(&record);
    }
    print!("{}", render::render_record(&record));
    Ok(())
}

async fn create<P: EditPayload>(
    ctx: &CliContext,
    store: &CollectionStore<P, FsBackend>,
    title: &str,
    content: &ContentArgs,
) -> Result<()> {
    let draft = new_draft::<P>(title, content)?;
    let record = store.create(draft).await.map_err(user_facing)?;
    if ctx.json {
        return ctx.print_json(&record);
    }
    println!("{}", record.id);
    Ok(())
}

/// Updates replace the whole record on the server, so the draft starts from
/// the cached copy.
async fn update<P: EditPayload>(
    ctx: &CliContext,
    store: &CollectionStore<P, FsBackend>,
    id: &str,
    title: Option<String>,
    content: &ContentArgs,
) -> Result<()> {
    let current = store
        .get(id)
        .ok_or_else(|| user_facing(SyncError::RecordNotFound(id.to_string())))?;
    let draft = edit_draft(&current, title, content)?;
    let record = store.update(id, draft).await.map_err(user_facing)?;
    if ctx.json {
        return ctx.print_json(&record);
    }
    Ok(())
}

/// Payload fields settable from the command line. Flags left out keep the
/// current value.
trait EditPayload: RenderPayload + Default {
    fn apply_args(&mut self, content: &ContentArgs) -> Result<()>;
}

impl EditPayload for NoteContent {
    fn apply_args(&mut self, content: &ContentArgs) -> Result<()> {
        if let Some(body) = &content.content {
            self.notes_content = body.clone();
        }
        Ok(())
    }
}

impl EditPayload for FlashcardDeck {
    fn apply_args(&mut self, content: &ContentArgs) -> Result<()> {
        if !content.cards.is_empty() {
            self.flashcards = parse_cards(&content.cards)?;
        }
        Ok(())
    }
}

impl EditPayload for QuizContent {
    fn apply_args(&mut self, content: &ContentArgs) -> Result<()> {
        if let Some(path) = &content.questions {
            self.quiz_content = read_questions(path)?;
        }
        if content.randomized {
            self.is_randomized = true;
        } else if content.ordered {
            self.is_randomized = false;
        }
        self.timed_quiz = time_limit(content, self.timed_quiz);
        Ok(())
    }
}

fn new_draft<P: EditPayload>(title: &str, content: &ContentArgs) -> Result<Draft<P>> {
    let mut payload = P::default();
    payload.apply_args(content)?;
    let draft = Draft::new(title, payload);
    Ok(match &content.description {
        Some(description) => draft.with_description(description.clone()),
        None => draft,
    })
}

fn edit_draft<P: EditPayload>(
    current: &Record<P>,
    title: Option<String>,
    content: &ContentArgs,
) -> Result<Draft<P>> {
    let mut payload = current.payload.clone();
    payload.apply_args(content)?;
    Ok(Draft {
        title: title.unwrap_or_else(|| current.title.clone()),
        description: content
            .description
            .clone()
            .or_else(|| current.description.clone()),
        payload,
    })
}

fn parse_cards(cards: &[String]) -> Result<Vec<Flashcard>> {
    cards
        .iter()
        .map(|card| {
            let (front, back) = card
                .split_once('=')
                .ok_or_else(|| anyhow!("Card '{}' must look like FRONT=BACK", card))?;
            Ok(Flashcard::new(front.trim(), back.trim()))
        })
        .collect()
}

fn read_questions(path: &Path) -> Result<Vec<Question>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of questions", path.display()))
}

/// Edit the limit one unit at a time, the way the quiz form does. Units not
/// given keep their share of `current`.
fn time_limit(content: &ContentArgs, current: Option<u64>) -> Option<u64> {
    let inputs = [
        (TimeUnit::Hours, &content.hours),
        (TimeUnit::Minutes, &content.minutes),
        (TimeUnit::Seconds, &content.seconds),
    ];
    if inputs.iter().all(|(_, raw)| raw.is_none()) {
        return current;
    }
    let total = inputs
        .iter()
        .fold(current.unwrap_or(0), |total, (unit, raw)| match raw {
            Some(raw) => handle_time_change(*unit, raw, total),
            None => total,
        });
    Some(total).filter(|t| *t > 0)
}

fn parse_selection(raw: &str) -> Result<Vec<usize>> {
    let raw = raw.trim();
    if raw == "-" || raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| anyhow!("'{}' is not an option number", part.trim()))
        })
        .collect()
}

async fn forum(ctx: &CliContext, cmd: ForumCommands) -> Result<()> {
    let forum = ctx.api.forum();
    match cmd {
        ForumCommands::Comment {
            post_id,
            body,
            reply_to,
        } => {
            let comment = forum
                .create_comment(&post_id, &body.join(" "), reply_to.as_deref())
                .await
                .map_err(user_facing)?;
            if ctx.json {
                return ctx.print_json(&comment);
            }
            println!("{}", comment.id);
            Ok(())
        }
        ForumCommands::EditPost {
            post_id,
            title,
            body,
        } => forum
            .edit_post(&post_id, &title, &body)
            .await
            .map_err(user_facing),
        ForumCommands::DeletePost { post_id } => {
            forum.delete_post(&post_id).await.map_err(user_facing)
        }
        ForumCommands::Vote { target, id, value } => match target {
            VoteTarget::Post => forum.vote_post(&id, &value).await.map_err(user_facing),
            VoteTarget::Comment => forum.vote_comment(&id, &value).await.map_err(user_facing),
        },
    }
}

async fn misc(ctx: &CliContext, cmd: MiscCommands) -> Result<()> {
    match cmd {
        MiscCommands::Badges { check } => {
            if check {
                let awarded = ctx.api.badges().check_now().await.map_err(user_facing)?;
                if ctx.json {
                    return ctx.print_json(&awarded);
                }
                print!("{}", render::render_awarded(&awarded));
                return Ok(());
            }
            if ctx.json {
                return ctx.print_json(&studysyncapp::badges::BADGE_CATALOG);
            }
            print!("{}", render::render_catalog());
            Ok(())
        }
        MiscCommands::Config => {
            let data_dir = ctx.config.data_dir().map_err(user_facing)?;
            if ctx.json {
                let mut shown = ctx.config.clone();
                shown.auth_token = shown.auth_token.map(|_| "(set)".to_string());
                shown.data_dir = Some(data_dir);
                return ctx.print_json(&shown);
            }
            print!(
                "{}",
                render::render_config(&ctx.config, &data_dir.display().to_string())
            );
            Ok(())
        }
    }
}
