use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use skinai_contracts::assessment::{AssessmentRequest, AssessmentResult, PatientSex, Severity};
use skinai_contracts::chat::{chat_help, parse_intent, ChatRole, Conversation, CHAT_GREETING};
use skinai_contracts::events::{EventWriter, HISTORY_APPENDED, HISTORY_CLEARED, HISTORY_DELETED};
use skinai_contracts::history::{HistoryRecord, HistoryStore};
use skinai_contracts::profile::ProfileSource;
use skinai_contracts::progress::{compare, consecutive_comparisons, ComparisonResult};
use skinai_engine::config::{init_tracing, EngineConfig};
use skinai_engine::image::data_uri_from_file;
use skinai_engine::profile_client::HttpProfileClient;
use skinai_engine::{history_record, AssessmentEngine};

#[derive(Debug, Parser)]
#[command(
    name = "skinai",
    version,
    about = "Skin photo assessment, history and health chat"
)]
struct Cli {
    /// Directory holding the local history and the event journal.
    #[arg(
        long,
        global = true,
        env = "SKINAI_DATA_DIR",
        default_value = ".skinai"
    )]
    data_dir: PathBuf,
    /// Journal path; defaults to `<data-dir>/events.jsonl`.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Assess one skin photo and record it in the local history.
    Analyze(AnalyzeArgs),
    /// Interactive health assistant.
    Chat(ChatArgs),
    #[command(subcommand)]
    History(HistoryCommand),
    /// Compare two recorded assessments, older first.
    Compare(CompareArgs),
    /// Compare every pair of consecutive recorded assessments.
    Progress,
    /// Show the signed-in account profile.
    Profile(ProfileArgs),
    /// List known models.
    Models,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    sex: Option<PatientSex>,
    #[arg(long = "history")]
    medical_history: Option<String>,
    /// Account token used to prefill age and medical history.
    #[arg(long, env = "SKINAI_TOKEN")]
    token: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    no_save: bool,
}

#[derive(Debug, Args)]
struct ChatArgs {
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Subcommand)]
enum HistoryCommand {
    /// List recorded assessments, newest first.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        severity: Option<Severity>,
    },
    Show {
        id: String,
    },
    Delete {
        id: String,
    },
    Clear,
}

#[derive(Debug, Args)]
struct CompareArgs {
    before: String,
    after: String,
}

#[derive(Debug, Args)]
struct ProfileArgs {
    #[arg(long, env = "SKINAI_TOKEN")]
    token: String,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("skinai error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    init_tracing("warn");
    let cli = Cli::parse();
    let mut workspace = Workspace::open(&cli.data_dir, cli.events.as_deref());
    let mut out = io::stdout().lock();
    match cli.command {
        Command::Analyze(args) => run_analyze(&mut workspace, args, &mut out)?,
        Command::Chat(args) => run_chat(workspace, args)?,
        Command::History(command) => run_history(&mut workspace, command, &mut out)?,
        Command::Compare(args) => run_compare(&workspace, &args.before, &args.after, &mut out)?,
        Command::Progress => print_progress(&workspace, &mut out)?,
        Command::Profile(args) => run_profile(&args.token, &mut out)?,
        Command::Models => {
            let engine = AssessmentEngine::from_config(EngineConfig::from_env()?)?;
            for model in engine.models() {
                writeln!(
                    out,
                    "{:<20} {:<8} {}",
                    model.name,
                    model.provider,
                    model.capabilities.join(",")
                )?;
            }
        }
    }
    Ok(0)
}

/// Local history plus the journal that records changes to it.
struct Workspace {
    history: HistoryStore,
    events: EventWriter,
}

impl Workspace {
    fn open(data_dir: &Path, events: Option<&Path>) -> Self {
        let events_path = events
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join("events.jsonl"));
        let session_id = format!("cli-{}", Utc::now().format("%Y%m%dT%H%M%S"));
        Self {
            history: HistoryStore::open_in(data_dir),
            events: EventWriter::new(events_path, session_id),
        }
    }

    fn record(&mut self, result: &AssessmentResult, image_data: &str) -> Result<HistoryRecord> {
        let record = history_record(result, image_data);
        let evicted = self.history.append(record.clone())?;
        self.events.record(
            HISTORY_APPENDED,
            json!({
                "id": record.id(),
                "count": self.history.len(),
                "evicted": evicted.iter().map(HistoryRecord::id).collect::<Vec<_>>(),
            }),
        );
        Ok(record)
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let removed = self.history.delete(id)?;
        if removed {
            self.events.record(HISTORY_DELETED, json!({ "id": id }));
        }
        Ok(removed)
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.history.clear()?;
        self.events.record(HISTORY_CLEARED, json!({ "removed": removed }));
        Ok(removed)
    }
}

fn build_engine(workspace: &Workspace) -> Result<AssessmentEngine> {
    let config = EngineConfig::from_env()?;
    Ok(AssessmentEngine::from_config(config)?.with_events(workspace.events.clone()))
}

fn run_analyze(workspace: &mut Workspace, args: AnalyzeArgs, out: &mut impl Write) -> Result<()> {
    let image_data = data_uri_from_file(&args.image)
        .with_context(|| format!("failed to load {}", args.image.display()))?;
    let mut request = AssessmentRequest {
        image_data,
        patient_age: args.age,
        patient_sex: args.sex,
        medical_history: args.medical_history,
    };
    if let Some(token) = args.token.as_deref() {
        let config = EngineConfig::from_env()?;
        prefill_from_profile(&HttpProfileClient::new(&config)?, token, &mut request);
    }

    let mut engine = build_engine(workspace)?;
    if args.model.is_some() {
        engine.set_assessment_model(args.model);
    }
    let result = engine.assess(&request).map_err(|err| {
        let summary = err.analysis_response().error;
        anyhow::Error::new(err).context(summary)
    })?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        print_assessment(&result, out)?;
    }
    if !args.no_save {
        let record = workspace.record(&result, &request.image_data)?;
        if !args.json {
            writeln!(out, "Saved to history as {}", record.id())?;
        }
    }
    Ok(())
}

/// Fills missing patient fields from the account profile. A failed lookup
/// only loses the prefill.
fn prefill_from_profile(source: &dyn ProfileSource, token: &str, request: &mut AssessmentRequest) {
    match source.fetch_profile(token) {
        Ok(profile) => {
            let mut patient = request.patient_info();
            profile.fill_patient(&mut patient, Utc::now().date_naive());
            request.patient_age = patient.age;
            request.medical_history = patient.medical_history;
        }
        Err(err) => tracing::warn!("profile prefill skipped: {err:#}"),
    }
}

fn print_assessment(result: &AssessmentResult, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{} ({:.0}% confidence, {} severity, {} urgency)",
        result.condition, result.confidence, result.severity, result.urgency
    )?;
    writeln!(out, "{}", result.description)?;
    if !result.differential_diagnoses.is_empty() {
        writeln!(
            out,
            "Also consider: {}",
            result.differential_diagnoses.join(", ")
        )?;
    }
    if !result.recommendations.is_empty() {
        writeln!(out, "Recommendations:")?;
        for item in &result.recommendations {
            writeln!(out, "  - {item}")?;
        }
    }
    if let Some(follow_up) = result.follow_up.as_deref() {
        writeln!(out, "Follow-up: {follow_up}")?;
    }
    if let Some(flags) = result.red_flags.as_ref().filter(|flags| !flags.is_empty()) {
        writeln!(out, "Red flags: {}", flags.join("; "))?;
    }
    if let Some(knowledge) = result.medical_knowledge.as_ref() {
        writeln!(
            out,
            "Typical care: {} (see a {})",
            knowledge.common_treatments.join(", "),
            knowledge.specialist
        )?;
    }
    for warning in &result.safety_warnings {
        writeln!(out, "WARNING: {warning}")?;
    }
    writeln!(out, "{}", result.disclaimer)?;
    Ok(())
}

fn run_history(
    workspace: &mut Workspace,
    command: HistoryCommand,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        HistoryCommand::List { search, severity } => {
            print_history(&workspace.history, search.as_deref().unwrap_or(""), severity, out)?;
        }
        HistoryCommand::Show { id } => {
            let Some(record) = workspace.history.get(&id) else {
                bail!("no history record with id {id}");
            };
            print_assessment(&record.assessment, out)?;
            if let Some(score) = record.overall_score {
                writeln!(out, "Overall skin score: {score}/100")?;
            }
            for (metric, reading) in &record.skin_concerns {
                writeln!(out, "  {metric:<13} {:>3}  {}", reading.level, reading.status)?;
            }
        }
        HistoryCommand::Delete { id } => {
            if !workspace.delete(&id)? {
                bail!("no history record with id {id}");
            }
            writeln!(out, "Deleted {id}")?;
        }
        HistoryCommand::Clear => {
            let removed = workspace.clear()?;
            writeln!(out, "Cleared {removed} record(s)")?;
        }
    }
    Ok(())
}

fn print_history(
    history: &HistoryStore,
    term: &str,
    severity: Option<Severity>,
    out: &mut impl Write,
) -> Result<()> {
    let matches = history.search(term, severity);
    if matches.is_empty() {
        writeln!(out, "No matching assessments.")?;
        return Ok(());
    }
    for record in matches {
        writeln!(out, "{}", history_line(record))?;
    }
    Ok(())
}

fn history_line(record: &HistoryRecord) -> String {
    let score = record
        .overall_score
        .map(|score| format!("{score:>3}/100"))
        .unwrap_or_else(|| "   -   ".to_string());
    format!(
        "{}  {}  {:<8} {}  {}",
        record.id(),
        record.assessment.timestamp.format("%Y-%m-%d %H:%M"),
        record.assessment.severity,
        score,
        record.assessment.condition
    )
}

fn run_compare(workspace: &Workspace, before: &str, after: &str, out: &mut impl Write) -> Result<()> {
    let Some(before_record) = workspace.history.get(before) else {
        bail!("no history record with id {before}");
    };
    let Some(after_record) = workspace.history.get(after) else {
        bail!("no history record with id {after}");
    };
    print_comparison(&compare(before_record, after_record), out)
}

fn print_progress(workspace: &Workspace, out: &mut impl Write) -> Result<()> {
    let comparisons = consecutive_comparisons(workspace.history.records());
    if comparisons.is_empty() {
        writeln!(out, "At least two recorded assessments are needed to track progress.")?;
        return Ok(());
    }
    for comparison in &comparisons {
        print_comparison(comparison, out)?;
        writeln!(out)?;
    }
    Ok(())
}

fn print_comparison(comparison: &ComparisonResult, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{} -> {} ({} days)",
        comparison.before_id, comparison.after_id, comparison.days_difference
    )?;
    if let Some(delta) = comparison.overall_progress {
        writeln!(out, "Overall change: {delta:+}")?;
    }
    for item in &comparison.improvements {
        writeln!(out, "  + {item}")?;
    }
    for item in &comparison.concerns {
        writeln!(out, "  - {item}")?;
    }
    if comparison.improvements.is_empty() && comparison.concerns.is_empty() {
        writeln!(out, "  No significant changes.")?;
    }
    Ok(())
}

fn run_profile(token: &str, out: &mut impl Write) -> Result<()> {
    let config = EngineConfig::from_env()?;
    let profile = HttpProfileClient::new(&config)?.fetch_profile(token)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&profile)?)?;
    if let Some(age) = profile.age_on(Utc::now().date_naive()) {
        writeln!(out, "Age: {age}")?;
    }
    Ok(())
}

fn run_chat(workspace: Workspace, args: ChatArgs) -> Result<()> {
    let mut engine = build_engine(&workspace)?;
    if args.model.is_some() {
        engine.set_chat_model(args.model);
    }
    let mut session = ChatSession {
        engine,
        workspace,
        conversation: Conversation::with_greeting(),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    writeln!(stdout, "{CHAT_GREETING}")?;
    writeln!(stdout, "Type /help for commands.")?;

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();
        let read = match stdin.lock().read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        if session.handle_line(input, &mut stdout)? == LineOutcome::Quit {
            break;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOutcome {
    Continue,
    Quit,
}

struct ChatSession {
    engine: AssessmentEngine,
    workspace: Workspace,
    conversation: Conversation,
}

impl ChatSession {
    fn handle_line(&mut self, input: &str, out: &mut impl Write) -> Result<LineOutcome> {
        let intent = parse_intent(input);
        match intent.action.as_str() {
            "noop" => {}
            "quit" => return Ok(LineOutcome::Quit),
            "help" => {
                writeln!(out, "Commands: {}", chat_help())?;
            }
            "ask" => {
                let message = intent.prompt.unwrap_or_default();
                let request = self.conversation.request_for(&message);
                self.conversation.push(ChatRole::User, message);
                let reply = match self.engine.chat(&request) {
                    Ok(reply) => reply.response,
                    Err(err) => err
                        .chat_response()
                        .response
                        .unwrap_or_else(|| err.to_string()),
                };
                writeln!(out, "{}", reply.trim())?;
                self.conversation.push(ChatRole::Assistant, reply);
            }
            "reset_conversation" => {
                self.conversation = Conversation::with_greeting();
                writeln!(out, "Conversation cleared.")?;
            }
            "set_chat_model" => {
                let model = value_as_non_empty_string(intent.command_args.get("model"));
                self.engine.set_chat_model(model);
                writeln!(out, "Chat model set to {}", self.engine.chat_model())?;
            }
            "analyze" => {
                let Some(path) = value_as_non_empty_string(intent.command_args.get("path")) else {
                    writeln!(out, "/analyze requires an image path")?;
                    return Ok(LineOutcome::Continue);
                };
                let image_data = match data_uri_from_file(Path::new(&path)) {
                    Ok(data) => data,
                    Err(err) => {
                        writeln!(out, "Analyze failed: {err:#}")?;
                        return Ok(LineOutcome::Continue);
                    }
                };
                match self.engine.assess(&AssessmentRequest::new(image_data.clone())) {
                    Ok(result) => {
                        print_assessment(&result, out)?;
                        let record = self.workspace.record(&result, &image_data)?;
                        writeln!(out, "Saved to history as {}", record.id())?;
                    }
                    Err(err) => {
                        let payload = err.analysis_response();
                        writeln!(
                            out,
                            "Analyze failed: {} ({})",
                            payload.error,
                            payload.details.unwrap_or_default()
                        )?;
                    }
                }
            }
            "list_history" => {
                let raw = value_as_non_empty_string(intent.command_args.get("severity"));
                let severity = match raw.as_deref().map(str::parse::<Severity>).transpose() {
                    Ok(severity) => severity,
                    Err(message) => {
                        writeln!(out, "{message}")?;
                        return Ok(LineOutcome::Continue);
                    }
                };
                print_history(&self.workspace.history, "", severity, out)?;
            }
            "search_history" => {
                let term = value_as_non_empty_string(intent.command_args.get("term"))
                    .unwrap_or_default();
                print_history(&self.workspace.history, &term, None, out)?;
            }
            "show_record" | "delete_record" => {
                let Some(id) = value_as_non_empty_string(intent.command_args.get("path")) else {
                    writeln!(out, "an assessment id is required")?;
                    return Ok(LineOutcome::Continue);
                };
                let command = if intent.action == "show_record" {
                    HistoryCommand::Show { id }
                } else {
                    HistoryCommand::Delete { id }
                };
                if let Err(err) = run_history(&mut self.workspace, command, out) {
                    writeln!(out, "{err:#}")?;
                }
            }
            "clear_history" => {
                run_history(&mut self.workspace, HistoryCommand::Clear, out)?;
            }
            "compare" => {
                let ids = value_as_string_list(intent.command_args.get("paths"));
                if ids.len() != 2 {
                    writeln!(out, "/compare requires two assessment ids")?;
                    return Ok(LineOutcome::Continue);
                }
                if let Err(err) = run_compare(&self.workspace, &ids[0], &ids[1], out) {
                    writeln!(out, "{err:#}")?;
                }
            }
            "progress" => print_progress(&self.workspace, out)?,
            _ => {
                let command = value_as_non_empty_string(intent.command_args.get("command"))
                    .unwrap_or_default();
                writeln!(out, "Unknown command /{command}. Type /help for commands.")?;
            }
        }
        Ok(LineOutcome::Continue)
    }
}

fn value_as_non_empty_string(value: Option<&Value>) -> Option<String> {
    let raw = value
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn value_as_string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use clap::Parser;
    use image::{Rgb, RgbImage};
    use serde_json::Value;
    use skinai_contracts::assessment::{AssessmentRequest, PatientSex, Severity};
    use skinai_contracts::chat::Conversation;
    use skinai_contracts::profile::{ProfileSnapshot, ProfileSource};
    use skinai_engine::config::EngineConfig;
    use skinai_engine::AssessmentEngine;

    use super::{
        history_line, prefill_from_profile, ChatSession, Cli, Command, HistoryCommand,
        LineOutcome, Workspace,
    };

    struct FixedProfile(Option<ProfileSnapshot>);

    impl ProfileSource for FixedProfile {
        fn fetch_profile(&self, _token: &str) -> anyhow::Result<ProfileSnapshot> {
            self.0
                .clone()
                .ok_or_else(|| anyhow::anyhow!("profile request failed (401): Invalid token"))
        }
    }

    fn offline_session(dir: &std::path::Path) -> anyhow::Result<ChatSession> {
        let config = EngineConfig {
            assessment_model: "dryrun-vision-1".to_string(),
            chat_model: "dryrun-text-1".to_string(),
            ..EngineConfig::default()
        };
        let workspace = Workspace::open(dir, None);
        let engine = AssessmentEngine::from_config(config)?.with_events(workspace.events.clone());
        Ok(ChatSession {
            engine,
            workspace,
            conversation: Conversation::with_greeting(),
        })
    }

    fn write_photo(path: &std::path::Path) -> anyhow::Result<()> {
        let mut canvas = RgbImage::new(8, 8);
        for pixel in canvas.pixels_mut() {
            *pixel = Rgb([210, 160, 140]);
        }
        canvas.save(path)?;
        Ok(())
    }

    #[test]
    fn cli_parses_analyze_flags() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "skinai",
            "--data-dir",
            "/tmp/skinai-test",
            "analyze",
            "--image",
            "arm.jpg",
            "--age",
            "34",
            "--sex",
            "female",
            "--history",
            "eczema",
        ])?;
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.sex, Some(PatientSex::Female));
        assert_eq!(args.medical_history.as_deref(), Some("eczema"));
        assert!(!args.no_save);
        Ok(())
    }

    #[test]
    fn cli_parses_history_filters() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "skinai",
            "history",
            "list",
            "--search",
            "acne",
            "--severity",
            "high",
        ])?;
        let Command::History(HistoryCommand::List { search, severity }) = cli.command else {
            panic!("expected history list");
        };
        assert_eq!(search.as_deref(), Some("acne"));
        assert_eq!(severity, Some(Severity::Severe));
        assert!(Cli::try_parse_from(["skinai", "analyze", "--image", "a.jpg", "--sex", "x"]).is_err());
        Ok(())
    }

    #[test]
    fn profile_prefill_fills_only_gaps() {
        let profile = ProfileSnapshot {
            date_of_birth: Some("1990-01-01".to_string()),
            medical_history: Some("Psoriasis".to_string()),
            ..ProfileSnapshot::default()
        };
        let mut request = AssessmentRequest::new("data:image/jpeg;base64,AAAA");
        request.medical_history = Some("Eczema".to_string());
        prefill_from_profile(&FixedProfile(Some(profile)), "token", &mut request);
        assert!(request.patient_age.is_some());
        assert_eq!(request.medical_history.as_deref(), Some("Eczema"));

        let mut untouched = AssessmentRequest::new("data:image/jpeg;base64,AAAA");
        prefill_from_profile(&FixedProfile(None), "bad", &mut untouched);
        assert_eq!(untouched.patient_age, None);
    }

    #[test]
    fn repl_analyze_records_history_and_journal() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("cheek.png");
        write_photo(&photo)?;
        let mut session = offline_session(&temp.path().join("data"))?;

        let mut out = Vec::new();
        session.handle_line(&format!("/analyze \"{}\"", photo.display()), &mut out)?;
        session.handle_line(&format!("/analyze {}", photo.display()), &mut out)?;
        let printed = String::from_utf8(out)?;
        assert!(printed.contains("Normal skin"));
        assert!(printed.contains("Saved to history as analysis_"));
        assert_eq!(session.workspace.history.len(), 2);

        let mut out = Vec::new();
        session.handle_line("/progress", &mut out)?;
        let printed = String::from_utf8(out)?;
        assert!(printed.contains("No significant changes."));

        let journal = fs::read_to_string(temp.path().join("data").join("events.jsonl"))?;
        let types: Vec<String> = journal
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter_map(|row| row.get("type").and_then(Value::as_str).map(str::to_string))
            .collect();
        assert!(types.contains(&"assessment_completed".to_string()));
        assert!(types.contains(&"history_appended".to_string()));
        Ok(())
    }

    #[test]
    fn repl_chat_tracks_conversation() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = offline_session(temp.path())?;
        let mut out = Vec::new();
        assert_eq!(
            session.handle_line("what helps with dry skin?", &mut out)?,
            LineOutcome::Continue
        );
        assert_eq!(session.conversation.len(), 3);
        assert!(String::from_utf8(out)?.contains("offline placeholder reply"));

        let mut out = Vec::new();
        session.handle_line("/reset", &mut out)?;
        assert_eq!(session.conversation.len(), 1);
        assert_eq!(session.handle_line("/quit", &mut out)?, LineOutcome::Quit);
        Ok(())
    }

    #[test]
    fn repl_reports_unknown_commands_and_missing_ids() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = offline_session(temp.path())?;
        let mut out = Vec::new();
        session.handle_line("/teleport now", &mut out)?;
        session.handle_line("/show nope", &mut out)?;
        session.handle_line("/compare only-one", &mut out)?;
        let printed = String::from_utf8(out)?;
        assert!(printed.contains("Unknown command /teleport"));
        assert!(printed.contains("no history record with id nope"));
        assert!(printed.contains("/compare requires two assessment ids"));
        Ok(())
    }

    #[test]
    fn history_line_shows_score_and_condition() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("arm.png");
        write_photo(&photo)?;
        let session = offline_session(temp.path())?;
        let image = skinai_engine::image::data_uri_from_file(&photo)?;
        let mut result = session.engine.assess(&AssessmentRequest::new(image.clone()))?;
        result.timestamp = Utc.with_ymd_and_hms(2026, 4, 2, 10, 30, 0).unwrap();
        let record = skinai_engine::history_record(&result, &image);
        let line = history_line(&record);
        assert!(line.contains("2026-04-02 10:30"));
        assert!(line.contains("/100"));
        assert!(line.ends_with("Normal skin"));
        Ok(())
    }
}
