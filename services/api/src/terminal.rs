use clap::Args;
use loan_rate::config::{AppConfig, ScoringConfig};
use loan_rate::error::AppError;
use loan_rate::rate_check::{
    normalize, ApplicantDraft, FieldName, FieldPreview, FormError, FormSession, FormState,
    HttpScoringClient, InputKind, KeyPress, RateCheckError, ResultOverlay, ScoringCollaborator,
    ScoringOutcome, STEPS,
};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Args, Debug, Default)]
pub(crate) struct CheckArgs {
    /// Override SCORING_API_URL for this run
    #[arg(long)]
    pub(crate) scoring_url: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct NormalizeArgs {
    /// Number of dependents
    #[arg(long)]
    pub(crate) dependents: Option<String>,
    /// Education level (0 = not graduate, 1 = graduate)
    #[arg(long)]
    pub(crate) education: Option<String>,
    /// Self employed (0 = no, 1 = yes)
    #[arg(long)]
    pub(crate) self_employed: Option<String>,
    /// Annual income in dollars
    #[arg(long)]
    pub(crate) income: Option<String>,
    /// Requested loan amount in dollars
    #[arg(long)]
    pub(crate) loan_amount: Option<String>,
    /// Loan term in months (1-12)
    #[arg(long)]
    pub(crate) term: Option<String>,
    /// Credit score (300-900)
    #[arg(long)]
    pub(crate) credit_score: Option<String>,
    /// Residential assets value in dollars
    #[arg(long)]
    pub(crate) residential: Option<String>,
    /// Commercial assets value in dollars
    #[arg(long)]
    pub(crate) commercial: Option<String>,
    /// Luxury assets value in dollars
    #[arg(long)]
    pub(crate) luxury: Option<String>,
    /// Bank asset value in dollars
    #[arg(long)]
    pub(crate) bank: Option<String>,
    /// Send the normalized answers to the scoring service
    #[arg(long)]
    pub(crate) submit: bool,
    /// Override SCORING_API_URL for this run
    #[arg(long)]
    pub(crate) scoring_url: Option<String>,
}

impl NormalizeArgs {
    fn draft(&self) -> ApplicantDraft {
        let answers = [
            (FieldName::NoOfDependents, &self.dependents),
            (FieldName::Education, &self.education),
            (FieldName::SelfEmployed, &self.self_employed),
            (FieldName::IncomeAnnum, &self.income),
            (FieldName::LoanAmount, &self.loan_amount),
            (FieldName::LoanTerm, &self.term),
            (FieldName::CibilScore, &self.credit_score),
            (FieldName::ResidentialAssetsValue, &self.residential),
            (FieldName::CommercialAssetsValue, &self.commercial),
            (FieldName::LuxuryAssetsValue, &self.luxury),
            (FieldName::BankAssetValue, &self.bank),
        ];

        let mut draft = ApplicantDraft::default();
        for (field, raw) in answers {
            if let Some(raw) = raw {
                draft.set_raw(field, raw);
            }
        }
        draft
    }
}

fn scoring_config(url_override: Option<String>) -> Result<ScoringConfig, AppError> {
    let scoring = AppConfig::load()?.scoring;
    match url_override {
        Some(url) => Ok(scoring.with_endpoint(&url)?),
        None => Ok(scoring),
    }
}

pub(crate) async fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let scoring = scoring_config(args.scoring_url)?;
    let client = HttpScoringClient::new(&scoring);
    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();

    drive_session(input, &mut out, &client).await?;
    Ok(())
}

pub(crate) async fn run_normalize(args: NormalizeArgs) -> Result<(), AppError> {
    let input = args
        .draft()
        .validate()
        .map_err(|error| AppError::RateCheck(error.into()))?;
    let features = normalize(&input);

    match serde_json::to_string_pretty(&features) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Normalized payload unavailable: {err}"),
    }

    if !args.submit {
        return Ok(());
    }

    let scoring = scoring_config(args.scoring_url)?;
    let client = HttpScoringClient::new(&scoring);
    match client.predict(&features).await {
        Ok(ScoringOutcome::Decided(status)) => {
            let mut out = std::io::stdout();
            render_overlay(&ResultOverlay::for_status(&status), &mut out)?;
            Ok(())
        }
        Ok(ScoringOutcome::Unrecognized) => {
            println!("Scoring service returned no loan status.");
            Ok(())
        }
        Err(error) => Err(AppError::RateCheck(RateCheckError::Scoring(error))),
    }
}

enum Command {
    Enter,
    Value(String),
    Back,
    Reset,
    Quit,
}

fn parse_line(line: &str) -> Command {
    match line.trim() {
        "" => Command::Enter,
        ":back" | ":b" => Command::Back,
        ":reset" => Command::Reset,
        ":quit" | ":q" => Command::Quit,
        value => Command::Value(value.to_string()),
    }
}

/// Run one form visit over line-based input. Each line answers the question
/// on screen and presses Enter; a blank line presses Enter alone.
pub(crate) async fn drive_session<R, W>(
    input: R,
    out: &mut W,
    scoring: &dyn ScoringCollaborator,
) -> Result<FormSession, AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = FormSession::new();
    let mut lines = input.lines();

    writeln!(out, "Check your loan rate")?;
    writeln!(
        out,
        "Answer each question and press Enter. Commands: :back, :reset, :quit"
    )?;
    render(&session, out)?;

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Command::Quit => break,
            Command::Back => session.previous(),
            Command::Reset => session.reset(),
            Command::Enter | Command::Value(_)
                if matches!(session.state(), FormState::Result(_)) =>
            {
                session.dismiss_result();
            }
            command => {
                if let (Command::Value(raw), Some(field)) = (&command, session.current_field()) {
                    if let Some(preview) = session.set_field(field.name, raw) {
                        write_preview(&preview, out)?;
                    }
                }
                match session.handle_key(KeyPress::enter(), scoring).await {
                    Ok(_) => {}
                    Err(FormError::Validation(_)) => {}
                    Err(other) => writeln!(out, "  ! {other}")?,
                }
            }
        }
        render(&session, out)?;
    }

    Ok(session)
}

fn render<W: Write>(session: &FormSession, out: &mut W) -> std::io::Result<()> {
    if let Some(overlay) = session.overlay() {
        return render_overlay(&overlay, out);
    }

    let Some(step) = session.current_step() else {
        return writeln!(out, "Checking your rate...");
    };
    let field = &STEPS[step];
    let value = session.draft().get(field.name);

    writeln!(out)?;
    writeln!(out, "Step {}/{}: {}", step + 1, STEPS.len(), field.label)?;
    if let InputKind::Select { options } = field.input {
        for option in options {
            writeln!(out, "  [{}] {}", option.value, option.label)?;
        }
    }
    match field.option_label(value) {
        Some(label) => writeln!(out, "  Current: {value} ({label})")?,
        None => writeln!(out, "  Current: {value}")?,
    }
    if let Some(preview) = session.preview() {
        write_preview(&preview, out)?;
    }
    if let Some(info) = field.info {
        writeln!(out, "  {info}")?;
    }
    if let Some(error) = session.field_error() {
        writeln!(out, "  ! {}", error.message)?;
    }
    if let FormState::Error(message) = session.state() {
        writeln!(out, "  ! {message}")?;
        writeln!(out, "  Press Enter to retry.")?;
    }
    Ok(())
}

fn write_preview<W: Write>(preview: &FieldPreview, out: &mut W) -> std::io::Result<()> {
    match preview.tier {
        Some(tier) => writeln!(
            out,
            "  Normalized Value: {:.4} ({})",
            preview.normalized,
            tier.label()
        ),
        None => writeln!(out, "  Normalized Value: {:.4}", preview.normalized),
    }
}

fn render_overlay<W: Write>(overlay: &ResultOverlay, out: &mut W) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "== {} ==", overlay.headline)?;
    writeln!(out, "{}", overlay.message)?;
    writeln!(out, "{}", overlay.follow_up)?;
    if let Some(action) = overlay.primary_action {
        writeln!(out, "  Next: {action}")?;
    }
    writeln!(
        out,
        "[Enter] {} (starts a new check)  [:quit] Exit",
        overlay.dismiss_action
    )
}
