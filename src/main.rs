use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use theme_resizer::api::ApiClient;
use theme_resizer::catalog::LayoutCatalog;
use theme_resizer::config::{self, CatalogSource, ResizerConfig};
use theme_resizer::imaging::{RustBackend, parse_size};
use theme_resizer::output;
use theme_resizer::pipeline::{self, BatchPipeline, PipelineOptions, ProcessSummary};
use theme_resizer::profiles::{self, JsonFileProfileStore, Profile, ProfileStore};
use theme_resizer::types::RecordUpdate;
use theme_resizer::upload::{self, ThemeUploadForm, UploadFile};
use tracing::warn;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Built once per process
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "theme-resizer")]
#[command(about = "Batch-resize theme artwork to exact layout sizes")]
#[command(long_about = "\
Batch-resize theme artwork to exact layout sizes

Each image is matched to a layout by a code in its filename and stretched
to that layout's exact pixel size. Images without a code keep their size.

  cover_158A_final.jpg   → 158A.png   1080×1720
  night-620c.webp        → 620C.png  10200×3060
  banner.png             → banner.png (own size)

Inputs may be images (png, jpg, jpeg, webp), zip archives, or directories.
Zip members are processed in archive order; rar and other containers are
skipped with a notice.

Run 'theme-resizer gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Show debug logs (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize inputs and export them as a zip bundle or separate files
    Resize {
        /// Images, zip archives or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Zip bundle path (defaults to export.archive_name)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Write separate files into this directory instead of a bundle
        #[arg(long, conflicts_with = "output")]
        split: Option<PathBuf>,
        /// Custom size for every unmatched image, e.g. 800x600
        #[arg(long, value_parser = parse_size_arg)]
        size: Option<(u32, u32)>,
    },
    /// Show which layout each filename resolves to
    Match {
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// Print the active layout catalog
    Layouts,
    /// Print active theme categories and theme lists from the API
    ThemeOptions,
    /// Resize inputs and upload them as one theme
    Upload(UploadArgs),
    /// Manage saved upload profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct UploadArgs {
    /// Images, zip archives or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Theme name
    #[arg(long)]
    name: String,
    /// Load category, theme lists, layout list and color from a saved profile
    #[arg(long)]
    profile: Option<String>,
    #[command(flatten)]
    fields: ProfileFields,
    /// Explicit thumbnail (defaults to the first unmatched image)
    #[arg(long)]
    thumbnail: Option<PathBuf>,
    /// Do not show the theme on the live view
    #[arg(long)]
    hide_liveview: bool,
    /// Build and print the upload without sending it
    #[arg(long)]
    dry_run: bool,
}

/// Form fields shared by `upload` and `profile save`.
#[derive(clap::Args)]
struct ProfileFields {
    /// Theme category id
    #[arg(long)]
    category: Option<String>,
    /// Theme list id (repeatable)
    #[arg(long = "theme-list")]
    theme_lists: Vec<i64>,
    /// Layout list id
    #[arg(long)]
    layout_list: Option<String>,
    /// Theme color (#rgb or #rrggbb)
    #[arg(long)]
    color: Option<String>,
}

impl ProfileFields {
    fn to_profile(&self) -> Profile {
        let mut lists = Vec::new();
        for &id in &self.theme_lists {
            if !lists.contains(&id) {
                lists.push(id);
            }
        }
        Profile {
            category_id: self.category.clone().unwrap_or_default(),
            selected_theme_lists: lists,
            layout_list_id: self.layout_list.clone().unwrap_or_default(),
            color: self.color.clone().unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// List saved profile names
    List,
    /// Show one profile
    Show { name: String },
    /// Save (or overwrite) a profile
    Save {
        name: String,
        #[command(flatten)]
        fields: ProfileFields,
    },
    /// Delete a profile
    Delete { name: String },
}

fn parse_size_arg(s: &str) -> Result<(u32, u32), String> {
    parse_size(s).ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Resize {
            inputs,
            output: bundle,
            split,
            size,
        } => {
            let config = config::load_config(&cli.config_dir)?;
            init_thread_pool(&config.processing);
            let mut pipeline = new_pipeline(&config, load_catalog(&config));
            let summary = run_batch(&mut pipeline, &inputs)?;

            if let Some((width, height)) = size {
                let unmatched: Vec<usize> = (0..pipeline.len())
                    .filter(|&i| pipeline.records()[i].is_unmapped())
                    .collect();
                for index in unmatched {
                    pipeline.update_record(index, &RecordUpdate::custom_size(width, height))?;
                }
            }
            output::print_summary(&summary);

            match split {
                Some(dir) => {
                    let paths = pipeline.export_individual(&dir)?;
                    output::print_export(paths.len(), &dir);
                }
                None => {
                    let path =
                        bundle.unwrap_or_else(|| PathBuf::from(&config.export.archive_name));
                    let zip = pipeline.export_all()?;
                    std::fs::write(&path, zip)?;
                    output::print_export(pipeline.len(), &path);
                }
            }
        }
        Command::Match { filenames } => {
            let config = config::load_config(&cli.config_dir)?;
            let catalog = load_catalog(&config);
            for filename in &filenames {
                output::print_match(filename, &catalog);
            }
        }
        Command::Layouts => {
            let config = config::load_config(&cli.config_dir)?;
            output::print_catalog(&load_catalog(&config));
        }
        Command::ThemeOptions => {
            let config = config::load_config(&cli.config_dir)?;
            let client = ApiClient::new(&config.api)?;
            let categories = client.fetch_theme_categories()?;
            let lists = client.fetch_theme_lists()?;
            output::print_lines(&output::format_theme_options("Categories", &categories));
            output::print_lines(&output::format_theme_options("Theme lists", &lists));
        }
        Command::Upload(args) => {
            let config = config::load_config(&cli.config_dir)?;
            init_thread_pool(&config.processing);
            run_upload(&config, &cli.config_dir, args)?;
        }
        Command::Profile(command) => {
            let config = config::load_config(&cli.config_dir)?;
            let store = JsonFileProfileStore::new(config.profiles_path(&cli.config_dir));
            run_profile_command(&store, command)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Size the global rayon pool from `[processing]`.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn new_pipeline(config: &ResizerConfig, catalog: LayoutCatalog) -> BatchPipeline<RustBackend> {
    BatchPipeline::new(
        RustBackend::new(),
        catalog,
        PipelineOptions {
            filter: config.render.filter,
        },
    )
}

/// The configured catalog. A failed remote load leaves it empty, so every
/// image keeps its own size.
fn load_catalog(config: &ResizerConfig) -> LayoutCatalog {
    match config.catalog.source {
        CatalogSource::Builtin => config.builtin_catalog(),
        CatalogSource::Remote => match fetch_remote_catalog(config) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "remote layout catalog unavailable");
                eprintln!("Warning: could not load layouts ({e}); images keep their own size");
                LayoutCatalog::empty()
            }
        },
    }
}

fn fetch_remote_catalog(
    config: &ResizerConfig,
) -> Result<LayoutCatalog, theme_resizer::api::ApiError> {
    let client = ApiClient::new(&config.api)?;
    Ok(LayoutCatalog::from_entries(client.fetch_layouts()?))
}

/// Process inputs, printing events as they arrive.
fn run_batch(
    pipeline: &mut BatchPipeline<RustBackend>,
    paths: &[PathBuf],
) -> Result<ProcessSummary, Box<dyn std::error::Error>> {
    let inputs = pipeline::collect_inputs(paths)?;
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_pipeline_event(&event);
        }
    });
    let summary = pipeline.process(inputs, Some(&tx));
    drop(tx);
    printer.join().map_err(|_| "output thread panicked")?;
    Ok(summary)
}

fn run_upload(
    config: &ResizerConfig,
    config_dir: &Path,
    args: UploadArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut form = ThemeUploadForm::from_config(&config.upload);
    form.name = args.name;
    form.display_on_liveview = !args.hide_liveview;
    if let Some(name) = &args.profile {
        let store = JsonFileProfileStore::new(config.profiles_path(config_dir));
        form.apply_profile(&profiles::require(&store, name)?);
    }
    // Explicit flags override the profile
    form.apply_profile(&args.fields.to_profile());
    if let Some(path) = &args.thumbnail {
        form.thumbnail = Some(UploadFile::read(path)?);
    }

    // Layout ids only exist in the remote catalog
    let client = ApiClient::new(&config.api)?;
    let catalog = LayoutCatalog::from_entries(client.fetch_layouts()?);
    let mut pipeline = new_pipeline(config, catalog);
    let summary = run_batch(&mut pipeline, &args.inputs)?;
    output::print_summary(&summary);

    let submission = if args.dry_run {
        upload::prepare_upload(&form, &pipeline)?
    } else {
        upload::upload_theme(&client, &form, &pipeline)?
    };
    output::print_lines(&output::format_upload(&submission));
    Ok(())
}

fn run_profile_command(
    store: &dyn ProfileStore,
    command: ProfileCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ProfileCommand::List => {
            output::print_lines(&output::format_profile_names(&store.keys()?));
        }
        ProfileCommand::Show { name } => {
            let profile = profiles::require(store, &name)?;
            output::print_lines(&output::format_profile(&name, &profile));
        }
        ProfileCommand::Save { name, fields } => {
            let profile = fields.to_profile();
            if !profile.color.is_empty() && !config::is_hex_color(&profile.color) {
                return Err(format!("color must be #rgb or #rrggbb, got {:?}", profile.color).into());
            }
            store.put(&name, &profile)?;
            println!("Saved profile {name:?}");
        }
        ProfileCommand::Delete { name } => {
            if store.delete(&name)? {
                println!("Deleted profile {name:?}");
            } else {
                return Err(profiles::ProfileError::NotFound(name).into());
            }
        }
    }
    Ok(())
}
