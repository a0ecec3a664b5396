use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cp_ast::CpSyntax;
use cp_compile::{compile, CompileOptions, PrintMode};
use cp_parser::parse_comprehensions;

mod logging;

#[derive(Parser)]
#[command(
    name = "comprehend",
    version,
    about = "comprehend: compile array comprehensions to plain JavaScript"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Desugar comprehensions and emit plain code.
    Compile {
        /// Input .js/.ts file.
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Spaces per indentation level in generated code.
        #[arg(long)]
        indent_width: Option<usize>,
        /// Write a source map with this file name and link it from the output.
        #[arg(long, value_name = "NAME")]
        source_map: Option<String>,
        /// Print the whole module instead of splicing into the input text.
        #[arg(long)]
        reprint: bool,
        /// JSON file with compile options (camelCase keys).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Parse and desugar the file, reporting any errors.
    Check { input: PathBuf },
    /// Parse and dump the AST, comprehensions shown as marker calls.
    Parse {
        input: PathBuf,
        /// Dump as JSON.
        #[arg(long)]
        ast: bool,
    },
}

fn read_source(input: &Path) -> Result<String> {
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn load_options(config: Option<&Path>, input: &Path) -> Result<CompileOptions> {
    let mut options = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => CompileOptions::default(),
    };
    options.source_file_name = input.display().to_string();
    Ok(options)
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            indent_width,
            source_map,
            reprint,
            config,
        } => {
            let source = read_source(&input)?;
            let mut options = load_options(config.as_deref(), &input)?;
            if indent_width.is_some() {
                options.indent_width = indent_width;
            }
            if source_map.is_some() {
                options.source_map_name = source_map;
            }
            if reprint {
                options.print_mode = PrintMode::Reprint;
            }

            let compiled = compile(&source, &options)?;
            let mut code = compiled.code;

            if let (Some(name), Some(map)) = (&options.source_map_name, &compiled.map) {
                let map_path = match output.as_deref().and_then(Path::parent) {
                    Some(dir) => dir.join(name),
                    None => PathBuf::from(name),
                };
                std::fs::write(&map_path, map)
                    .with_context(|| format!("failed to write {}", map_path.display()))?;
                tracing::info!(path = %map_path.display(), "wrote source map");

                if !code.ends_with('\n') {
                    code.push('\n');
                }
                code.push_str(&format!("//# sourceMappingURL={name}\n"));
            }

            match &output {
                Some(path) => std::fs::write(path, &code)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{code}"),
            }
        }
        Commands::Check { input } => {
            let source = read_source(&input)?;
            let options = load_options(None, &input)?;
            compile(&source, &options)?;
            eprintln!("OK: {}", options.source_file_name);
        }
        Commands::Parse { input, ast } => {
            let source = read_source(&input)?;
            let filename = input.display().to_string();
            let parsed = parse_comprehensions(&source, &filename, &CpSyntax::for_file(&filename))?;

            if ast {
                let json = serde_json::to_string_pretty(&parsed.module)?;
                println!("{json}");
            } else {
                println!("{:#?}", parsed.module);
            }
        }
    }

    Ok(())
}
