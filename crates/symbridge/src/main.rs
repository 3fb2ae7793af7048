use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use symbridge_core::ast::{AstContext, DeclId, DeclarationName};
use symbridge_core::source::{ExternalAstSource, ExternalDeclSource, NamespaceMap, TracingLog};
use symbridge_core::target::{Module, Target};
use symbridge_core::{BridgeConfig, SymbridgeError, SymbridgeResult};
use symbridge_utils::{debug, info, init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel};

/// Resolve debugger expression names and namespaces against a program's debug information.
#[derive(Parser, Debug)]
#[command(name = "symbridge")]
#[command(version)]
#[command(about = "Resolve debugger expression names and namespaces against a program's debug information", long_about = None)]
struct Cli
{
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Write logs to ~/.symbridge/ instead of stderr
    #[arg(long, global = true, default_value_t = false)]
    log_file: bool,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Resolve a namespace path, one segment at a time, across all binaries
    Namespaces
    {
        /// Binaries to load, in load order
        #[arg(required = true)]
        binaries: Vec<PathBuf>,
        /// Namespace path such as `outer::inner`
        #[arg(long)]
        path: String,
    },
    /// Look a name up the way an expression evaluator would
    Lookup
    {
        /// Binaries to load, in load order
        #[arg(required = true)]
        binaries: Vec<PathBuf>,
        /// Name to look up
        #[arg(long)]
        name: String,
        /// Namespace path to look the name up in (default: top level)
        #[arg(long)]
        scope: Option<String>,
        /// Character whose identifiers switch external lookups on
        /// (default: SYMBRIDGE_ACTIVATION_CHAR or `$`)
        #[arg(long)]
        activation_char: Option<char>,
    },
}

fn main()
{
    let cli = Cli::parse();

    if let Err(e) = init_cli_logging(cli.log_level, cli.log_file) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_command(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_cli_logging(level: Option<LogLevel>, to_file: bool) -> Result<(), Box<dyn std::error::Error>>
{
    if to_file {
        let path = init_logging_to_file(level)?;
        info!("Logging to {}", path.display());
    } else if let Some(level) = level {
        init_logging_with_level(level, LogFormat::Pretty)?;
    } else {
        init_logging()?;
    }
    Ok(())
}

fn run_command(command: Commands) -> Result<(), Box<dyn std::error::Error>>
{
    match command {
        Commands::Namespaces { binaries, path } => {
            let target = load_target(&binaries)?;
            let bridge = ExternalDeclSource::new(&target).with_log(Rc::new(TracingLog));

            let mut map: Option<NamespaceMap> = None;
            for segment in split_path(&path)? {
                let next = bridge.resolve_namespace(segment, map.as_ref());
                if next.is_empty() {
                    println!("{path}: no module defines `{segment}` here");
                    return Ok(());
                }
                map = Some(next);
            }

            if let Some(map) = map {
                for (module, namespace) in &map {
                    println!("{}: {namespace}", module.path().display());
                }
            }
            Ok(())
        }
        Commands::Lookup {
            binaries,
            name,
            scope,
            activation_char,
        } => {
            let target = load_target(&binaries)?;
            let mut config = BridgeConfig::from_env();
            if let Some(activation_char) = activation_char {
                config = config.with_activation_char(activation_char);
            }
            lookup(&target, config, &name, scope.as_deref())
        }
    }
}

fn lookup(
    target: &Target,
    config: BridgeConfig,
    name: &str,
    scope_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>>
{
    let mut ast = AstContext::new();
    let mut bridge = ExternalDeclSource::with_config(Some(target), config).with_log(Rc::new(TracingLog));
    bridge.start_translation_unit(&mut ast);
    let tu = ast.translation_unit();

    if !bridge.lookups_enabled() {
        // Referring to the bare activation identifier switches lookups on.
        let activator = DeclarationName::identifier(config.activation_char.to_string());
        ast.lookup_name(tu, &activator, &mut bridge);
        debug!(enabled = bridge.lookups_enabled(), "Activated external lookups");
    }

    let mut scope = tu;
    if let Some(scope_path) = scope_path {
        for segment in split_path(scope_path)? {
            let found = ast.lookup_name(scope, &DeclarationName::identifier(segment), &mut bridge);
            scope = found
                .into_iter()
                .find(|decl| ast.decl(*decl).is_namespace())
                .ok_or_else(|| SymbridgeError::InvalidArgument(format!("namespace `{segment}` not found")))?;
        }
    }

    let decls = ast.lookup_name(scope, &DeclarationName::identifier(name), &mut bridge);
    if decls.is_empty() {
        println!("{name}: not found");
    }
    for decl in decls {
        print_decl(&ast, decl);
    }
    Ok(())
}

fn print_decl(ast: &AstContext, decl: DeclId)
{
    println!("{}", ast.describe_decl(decl));
    for (index, param) in ast.decl(decl).params().iter().enumerate() {
        println!("  #{index}: {}", ast.describe_decl(*param));
    }
}

fn load_target(binaries: &[PathBuf]) -> SymbridgeResult<Target>
{
    let mut target = Target::new();
    for binary in binaries {
        if !binary.is_file() {
            return Err(SymbridgeError::InvalidArgument(format!(
                "{} is not a file",
                binary.display()
            )));
        }
        target.images_mut().append(Module::new(binary.clone()));
    }
    info!("Loaded {} module(s)", target.images().len());
    Ok(target)
}

/// Split `a::b::c` into its segments.
fn split_path(path: &str) -> SymbridgeResult<Vec<&str>>
{
    let segments: Vec<&str> = path.split("::").map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(SymbridgeError::InvalidArgument(format!("malformed namespace path `{path}`")));
    }
    Ok(segments)
}
