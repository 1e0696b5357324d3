use anyhow::{Context, Result, bail};
use attachment_picker_config::Config;
use attachment_picker_engine::{
    AcquisitionSurface, AttachmentMaterializer, AttachmentPicker, CallerHandle, FileItemResolver,
    PermissionCapability, PermissionGate, PermissionStatus, PickKind, PickOptions, PickOutcome,
    PromptOutcome, RawItem, RequestId, SurfaceLaunch, SurfaceOutcome,
};
use std::collections::{HashSet, VecDeque};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::{env, fs, process};

/// The terminal is the only interaction context this host has
struct Terminal;

/// Something the user has to answer before the request can move on
#[derive(Debug)]
enum Interaction {
    Prompt {
        request: RequestId,
        capability: PermissionCapability,
    },
    Surface {
        request: RequestId,
        launch: SurfaceLaunch,
    },
}

type Interactions = Arc<Mutex<VecDeque<Interaction>>>;

/// Grants last for the life of the process
struct TerminalGate {
    granted: Arc<Mutex<HashSet<PermissionCapability>>>,
    interactions: Interactions,
}

impl PermissionGate<Terminal> for TerminalGate {
    fn status(&self, _context: &Terminal, capability: PermissionCapability) -> PermissionStatus {
        let granted = self.granted.lock().unwrap_or_else(|e| e.into_inner());
        if granted.contains(&capability) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::NotDetermined
        }
    }

    fn request_prompt(
        &self,
        _context: &Terminal,
        capability: PermissionCapability,
        request: RequestId,
    ) -> Result<(), String> {
        self.interactions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Interaction::Prompt {
                request,
                capability,
            });
        Ok(())
    }
}

struct TerminalSurface {
    interactions: Interactions,
}

impl AcquisitionSurface<Terminal> for TerminalSurface {
    fn launch(&self, _context: &Terminal, request: RequestId, launch: &SurfaceLaunch) -> Result<(), String> {
        self.interactions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Interaction::Surface {
                request,
                launch: launch.clone(),
            });
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
struct Args {
    kind: PickKind,
    extensions: Vec<String>,
    storage_dir: Option<PathBuf>,
    /// Persist the effective configuration before picking
    write_config: bool,
}

fn parse_kind(name: &str) -> Option<PickKind> {
    [
        PickKind::Camera,
        PickKind::Gallery,
        PickKind::Document,
        PickKind::Audio,
    ]
    .into_iter()
    .find(|kind| kind.as_str() == name)
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut args = args.into_iter();
    let mut kind = None;
    let mut extensions = Vec::new();
    let mut storage_dir = None;
    let mut write_config = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ext" => extensions.push(args.next().context("--ext needs a value")?),
            "--storage" => {
                storage_dir = Some(PathBuf::from(args.next().context("--storage needs a value")?))
            }
            "--write-config" => write_config = true,
            other if kind.is_none() => {
                kind = Some(parse_kind(other).with_context(|| format!("Unknown pick kind '{other}'"))?)
            }
            other => bail!("Unexpected argument '{other}'"),
        }
    }

    let kind = kind.context("Missing pick kind")?;
    if kind != PickKind::Document && !extensions.is_empty() {
        bail!("--ext only applies to document picks");
    }

    Ok(Args {
        kind,
        extensions,
        storage_dir,
        write_config,
    })
}

/// y/yes (any case) grants; anything else, including EOF, denies
fn parse_consent(answer: &str) -> PromptOutcome {
    let answer = answer.trim().to_ascii_lowercase();
    PromptOutcome::from(answer == "y" || answer == "yes")
}

fn ask(input: &mut impl BufRead, question: &str) -> Result<String> {
    eprint!("{question} ");
    io::stderr().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn describe(launch: &SurfaceLaunch) -> String {
    match launch {
        SurfaceLaunch::Camera { .. } => "Path to an image to use as the captured photo".to_string(),
        SurfaceLaunch::Gallery => "Path to an image".to_string(),
        SurfaceLaunch::Document { filter } | SurfaceLaunch::Audio { filter } => {
            format!("Path to a file ({})", filter.content_types().join(", "))
        }
    }
}

/// Stand-in for the platform picker UI: an empty answer cancels
fn answer_surface(input: &mut impl BufRead, launch: &SurfaceLaunch) -> Result<SurfaceOutcome> {
    let answer = ask(input, &format!("{} [empty to cancel]:", describe(launch)))?;
    if answer.is_empty() {
        return Ok(SurfaceOutcome::Cancelled);
    }

    let SurfaceLaunch::Camera { capture_target } = launch else {
        return Ok(SurfaceOutcome::Produced(RawItem::Content { locator: answer }));
    };

    // The "camera" copies the chosen image to where a real one would write its frame
    Ok(match fs::copy(&answer, capture_target) {
        Ok(_) => SurfaceOutcome::Produced(RawItem::Capture {
            path: capture_target.clone(),
        }),
        Err(e) => SurfaceOutcome::Unavailable(format!("Cannot capture from {answer}: {e}")),
    })
}

/// The loaded configuration with command-line overrides applied
fn effective_config(args: &Args, config: Config) -> Config {
    match &args.storage_dir {
        Some(dir) => config.with_storage_dir(dir),
        None => config,
    }
}

fn run(args: Args, config: Config) -> Result<PickOutcome> {
    let interactions: Interactions = Arc::default();
    let granted: Arc<Mutex<HashSet<PermissionCapability>>> = Arc::default();

    let storage_dir = config.storage_dir;
    log::info!("Storing attachments under {}", storage_dir.display());

    let mut picker: AttachmentPicker<Terminal> = AttachmentPicker::new(
        Box::new(TerminalGate {
            granted: granted.clone(),
            interactions: interactions.clone(),
        }),
        Box::new(TerminalSurface {
            interactions: interactions.clone(),
        }),
        AttachmentMaterializer::new(storage_dir, Box::new(FileItemResolver)),
    );

    let result: Arc<Mutex<Option<PickOutcome>>> = Arc::default();
    let sink = result.clone();
    let caller = CallerHandle::new(move |outcome| {
        *sink.lock().unwrap_or_else(|e| e.into_inner()) = Some(outcome);
    });

    let options = PickOptions::with_extensions(args.extensions);
    if let Err(rejected) = picker.pick(Some(&Terminal), args.kind, options, caller) {
        bail!("{}", rejected.error);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        if let Some(outcome) = result.lock().unwrap_or_else(|e| e.into_inner()).take() {
            return Ok(outcome);
        }

        let next = interactions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Interaction::Prompt {
                request,
                capability,
            }) => {
                let answer = ask(&mut input, &format!("Allow access to {capability}? [y/N]"))?;
                let outcome = parse_consent(&answer);
                if outcome == PromptOutcome::Granted {
                    granted
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .insert(capability);
                }
                picker.on_permission_result(Some(&Terminal), request, capability, outcome);
            }
            Some(Interaction::Surface { request, launch }) => {
                let outcome = answer_surface(&mut input, &launch)?;
                picker.on_surface_result(Some(&Terminal), request, outcome);
            }
            None => bail!("Pick request stalled with nothing left to ask"),
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "attachment-picker-cli".to_string());

    let parsed = match parse_args(args.into_iter().skip(1)) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!(
                "Usage: {program} <camera|gallery|document|audio> [--ext EXT]... [--storage DIR] [--write-config]"
            );
            process::exit(2);
        }
    };

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();
    log::debug!("Config path: {}", Config::config_path().display());

    let config = effective_config(&parsed, config);
    if parsed.write_config {
        config.save()?;
        log::info!("Wrote {}", Config::config_path().display());
    }

    match run(parsed, config)? {
        Ok(descriptor) => {
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {e}", e.code());
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_document_with_extensions() {
        let parsed = args(&["document", "--ext", "pdf", "--ext", "docx", "--storage", "/tmp/x"]).unwrap();
        assert_eq!(
            parsed,
            Args {
                kind: PickKind::Document,
                extensions: vec!["pdf".to_string(), "docx".to_string()],
                storage_dir: Some(PathBuf::from("/tmp/x")),
                write_config: false,
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(args(&[]).is_err());
        assert!(args(&["video"]).is_err());
        assert!(args(&["camera", "gallery"]).is_err());
        assert!(args(&["document", "--ext"]).is_err());
    }

    #[test]
    fn test_extensions_only_for_documents() {
        assert!(args(&["camera", "--ext", "pdf"]).is_err());
        assert!(args(&["gallery", "--ext", "png"]).is_err());
        assert!(args(&["--ext", "mp3", "audio"]).is_err());
        assert_eq!(args(&["audio"]).unwrap().extensions, Vec::<String>::new());
    }

    #[test]
    fn test_storage_override_is_written_to_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        let parsed = args(&["gallery", "--storage", "/srv/attachments", "--write-config"]).unwrap();
        assert!(parsed.write_config);

        let config = effective_config(&parsed, Config::default());
        assert_eq!(config.storage_dir, PathBuf::from("/srv/attachments"));
        config.save_to_path(&config_path).unwrap();

        let reloaded = Config::load_from_path(&config_path).unwrap().unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_consent_answers() {
        assert_eq!(parse_consent("y\n"), PromptOutcome::Granted);
        assert_eq!(parse_consent("YES"), PromptOutcome::Granted);
        assert_eq!(parse_consent(""), PromptOutcome::Denied);
        assert_eq!(parse_consent("nope"), PromptOutcome::Denied);
    }

    #[test]
    fn test_empty_answer_cancels_surface() {
        let mut input = Cursor::new("\n");
        let outcome = answer_surface(&mut input, &SurfaceLaunch::Gallery).unwrap();
        assert_eq!(outcome, SurfaceOutcome::Cancelled);
    }

    #[test]
    fn test_path_answer_produces_content() {
        let mut input = Cursor::new("/home/me/photo.png\n");
        let outcome = answer_surface(&mut input, &SurfaceLaunch::Gallery).unwrap();
        assert_eq!(
            outcome,
            SurfaceOutcome::Produced(RawItem::Content {
                locator: "/home/me/photo.png".to_string()
            })
        );
    }

    #[test]
    fn test_camera_copies_image_to_capture_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("frame.png");
        fs::write(&source, b"not really a png").unwrap();
        let capture_target = dir.path().join("capture_1");

        let mut input = Cursor::new(format!("{}\n", source.display()));
        let launch = SurfaceLaunch::Camera {
            capture_target: capture_target.clone(),
        };
        let outcome = answer_surface(&mut input, &launch).unwrap();

        assert_eq!(
            outcome,
            SurfaceOutcome::Produced(RawItem::Capture {
                path: capture_target.clone()
            })
        );
        assert_eq!(fs::read(&capture_target).unwrap(), b"not really a png");
    }
}
