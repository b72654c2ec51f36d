use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use viewcomfy_proxy::comfyui::history::execution_files;
use viewcomfy_proxy::inject::{inject_parameters, ExecutionId, InputStore};
use viewcomfy_proxy::utils::form_args::{load_uploads, parse_set_pairs};
use viewcomfy_proxy::{ComfyUIClient, Config, WorkflowDocument, WorkflowGraph};

#[derive(Parser, Debug)]
#[command(name = "vcctl", about = "CLI for ViewComfy workflows", version)]
struct Cli {
    /// Override COMFYUI_URL
    #[arg(global = true, long)]
    comfyui_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a view_comfy.json form document from a workflow_api.json
    Schema {
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Output path (defaults to stdout)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Apply form values to a workflow and print the result
    Finalize {
        #[command(flatten)]
        form: FormArgs,
        /// Output path (defaults to stdout)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Apply form values and queue the workflow with ComfyUI
    Run {
        #[command(flatten)]
        form: FormArgs,
        /// Verbose: print the finalized graph before sending
        #[arg(short, long)]
        verbose: bool,
    },
    /// List output files of a finished prompt
    History {
        #[arg(long)]
        prompt_id: String,
        /// Only files written by this execution
        #[arg(long)]
        execution_id: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct FormArgs {
    /// workflow_api.json or view_comfy.json (defaults to VIEW_COMFY_FILE_NAME)
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Form value as key=value (repeatable), e.g. `6-inputs-text="a dog"`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    sets: Vec<String>,
    /// Local file uploaded for a key (repeatable), e.g. `10-inputs-image=./dog.png`
    #[arg(long = "upload", value_name = "KEY=PATH")]
    uploads: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = Config::new();
    if let Some(url) = cli.comfyui_url {
        conf.comfyui_url = url;
    }

    match cli.command {
        Commands::Schema { file, title, description, out } => {
            let document = WorkflowDocument::load(&file).await?;
            let view_comfy = document.into_view_comfy(&title, &description);
            let text = serde_json::to_string_pretty(&view_comfy)?;
            write_or_print(out.as_deref(), &text).await?;
            Ok(())
        }
        Commands::Finalize { form, out } => {
            let (execution, graph) = finalize(&conf, form).await?;
            eprintln!("execution {}", execution);
            let text = serde_json::to_string_pretty(&graph)?;
            write_or_print(out.as_deref(), &text).await?;
            Ok(())
        }
        Commands::Run { form, verbose } => {
            let (execution, graph) = finalize(&conf, form).await?;
            if verbose {
                eprintln!("[verbose] Finalized graph:\n{}", serde_json::to_string_pretty(&graph)?);
            }
            let client = ComfyUIClient::new(conf.comfyui_url.clone());
            let client_id = uuid::Uuid::new_v4().to_string();
            match client.queue_prompt(&graph, &client_id).await {
                Ok(queued) => {
                    println!("execution {}", execution);
                    println!("{}", serde_json::to_string_pretty(&queued)?);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    for line in e.details() {
                        eprintln!("  {}", line);
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::History { prompt_id, execution_id } => {
            let client = ComfyUIClient::new(conf.comfyui_url.clone());
            let hist = client.get_history(&prompt_id).await.map_err(|e| {
                eprintln!("Error: {}", e);
                e
            })?;
            let files = execution_files(&hist, &prompt_id, execution_id.as_deref());
            if files.is_empty() {
                eprintln!("No output files found for prompt_id={}", prompt_id);
            }
            for f in files {
                if f.subfolder.is_empty() {
                    println!("{}", f.filename);
                } else {
                    println!("{}/{}", f.subfolder, f.filename);
                }
            }
            Ok(())
        }
    }
}

async fn finalize(
    conf: &Config,
    form: FormArgs,
) -> Result<(ExecutionId, WorkflowGraph), Box<dyn std::error::Error>> {
    let path = form.file.unwrap_or_else(|| conf.view_comfy_file.clone());
    let graph = WorkflowDocument::load(&path).await?.into_graph()?;

    let mut values = parse_set_pairs(&form.sets)?;
    values.extend(load_uploads(&form.uploads).await?);

    let execution = ExecutionId::new();
    let store = InputStore::new(conf.comfy_inputs_dir.clone());
    let finalized = inject_parameters(&graph, values, &execution, &store).await?;
    Ok((execution, finalized))
}

async fn write_or_print(out: Option<&Path>, text: &str) -> std::io::Result<()> {
    match out {
        Some(path) => {
            tokio::fs::write(path, text).await?;
            eprintln!("Saved {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
