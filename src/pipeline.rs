use anyhow::{Context, Result, anyhow};
use std::{fs, path::Path};

use threadcast::{
    ScheduleDiagnostic,
    config::Config,
    directives::{ScriptEntry, resolve_directives},
    formats,
    model::{Message, Schedule},
    timeline::build_schedule,
};

use crate::cli::{OutputFormat, ResolveCmd, ScheduleCmd, ScriptFormat};

pub fn run_schedule(cmd: ScheduleCmd, cfg: &Config) -> Result<()> {
    let span = tracing::info_span!("schedule", input = cmd.input.as_str(), to = ?cmd.to);
    let _g = span.enter();

    let messages = load_messages(&cmd.input, cmd.from)?;

    let outcome = build_schedule(&messages, cfg).context("invalid configuration")?;
    report_diagnostics(&outcome.diagnostics);
    log_schedule_summary(&outcome.schedule, cfg);

    let rendered = render_any(&outcome.schedule, cmd.to, cfg)?;

    if cmd.stdout {
        print!("{rendered}");
        tracing::info!(mode = "stdout", "wrote output");
        return Ok(());
    }

    let out_path = derive_output_path(&cmd)?;
    write_output(&out_path, &rendered, cmd.overwrite)?;
    tracing::info!(path = out_path.as_str(), "wrote output file");

    Ok(())
}

pub fn run_resolve(cmd: ResolveCmd) -> Result<()> {
    let messages = load_messages(&cmd.input, cmd.from)?;
    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}

fn load_messages(input: &str, from: Option<ScriptFormat>) -> Result<Vec<Message>> {
    let script_format = from.unwrap_or_else(|| infer_format_from_path_or_dash(input));
    tracing::info!(?script_format, "script format selected");

    let raw = read_input_to_string(input)?;
    tracing::info!(bytes = raw.len(), "read input");

    let entries = parse_any(&raw, script_format)
        .with_context(|| format!("failed parsing script as {script_format:?}"))?;
    let messages = resolve_directives(&entries).context("failed resolving script directives")?;
    Ok(messages)
}

fn infer_format_from_path_or_dash(input: &str) -> ScriptFormat {
    if input == "-" {
        return ScriptFormat::Txt;
    }
    let p = Path::new(input);
    match p
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "json" => ScriptFormat::Json,
        _ => ScriptFormat::Txt,
    }
}

fn read_input_to_string(input: &str) -> Result<String> {
    if input == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("failed reading script: {input}"))
    }
}

fn parse_any(raw: &str, fmt: ScriptFormat) -> Result<Vec<ScriptEntry>> {
    let trimmed = raw.trim_start();
    if fmt == ScriptFormat::Txt && (trimmed.starts_with('{') || trimmed.starts_with('[')) {
        tracing::info!("input looks like JSON; attempting JSON parse");
        if let Ok(entries) = formats::json::parse_json(raw) {
            return Ok(entries);
        }
    }

    match fmt {
        ScriptFormat::Txt => Ok(formats::txt::parse_txt(raw)?),
        ScriptFormat::Json => formats::json::parse_json(raw),
    }
}

fn report_diagnostics(diagnostics: &[ScheduleDiagnostic]) {
    for d in diagnostics {
        match d {
            ScheduleDiagnostic::InvariantFallback { stage, input_len, error }
            | ScheduleDiagnostic::InvariantViolation { stage, input_len, error } => {
                tracing::warn!(stage, input_len, %error, "schedule invariant failed");
            }
            other => tracing::debug!(diagnostic = ?other, "schedule diagnostic"),
        }
    }
}

fn log_schedule_summary(s: &Schedule, cfg: &Config) {
    tracing::info!(
        messages = s.timed_messages.len(),
        screens = s.screens.len(),
        total_frames = s.total_frames,
        duration_ms = s.duration_ms(),
        "schedule summary"
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        let n = cfg.logging.debug_message_samples.min(s.timed_messages.len());
        for (i, t) in s.timed_messages.iter().take(n).enumerate() {
            tracing::debug!(
                idx = i,
                appear_frame = t.appear_frame,
                duration_frames = t.duration_frames,
                conversation = t.message.conversation_id,
                chars = t.message.char_count(),
                "message sample"
            );
        }
    }
}

fn render_any(s: &Schedule, fmt: OutputFormat, cfg: &Config) -> Result<String> {
    match fmt {
        OutputFormat::Json => formats::json::write_json(
            s,
            cfg.output.time_units.as_str(),
            cfg.output.wrapped,
        ),
        OutputFormat::Txt => Ok(formats::txt::write_txt(s)),
        OutputFormat::Srt => Ok(formats::srt::write_srt(s, cfg.output.srt_wrap_width)),
        OutputFormat::Tsv => formats::tsv::write_tsv(s),
    }
}

fn derive_output_path(cmd: &ScheduleCmd) -> Result<String> {
    if let Some(o) = &cmd.output {
        return Ok(o.clone());
    }

    if cmd.input == "-" {
        return Err(anyhow!(
            "output path required when input is stdin and --stdout is not set"
        ));
    }

    let p = Path::new(&cmd.input);
    let stem = p
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("bad input filename"))?;

    let parent = p.parent().unwrap_or_else(|| Path::new("."));
    let out = parent.join(format!("{stem}.{}", cmd.to.extension()));
    Ok(out.to_string_lossy().to_string())
}

fn write_output(path: &str, data: &str, overwrite: bool) -> Result<()> {
    if Path::new(path).exists() && !overwrite {
        return Err(anyhow!(
            "refusing to overwrite existing file (pass --overwrite): {path}"
        ));
    }
    fs::write(path, data)?;
    Ok(())
}
