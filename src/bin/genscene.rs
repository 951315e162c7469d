use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use genscene::{
    ArtifactSink as _, CaptureRequest, DirSink, FsFetcher, Inbound, Outbound, SceneCache,
    SceneDocument, Session, SessionDeps, SessionOpts, Size, channel::bus::ANY_CHANNEL,
    export_bundle, export_snapshot, to_wire,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "genscene", version)]
struct Cli {
    /// Session options JSON (seed, timings, bundle layout).
    #[arg(long, global = true)]
    opts: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill mesh fuzz into an exported state and write the snapshot JSON.
    Snapshot(SnapshotArgs),
    /// Render a snapshot to one PNG per size.
    Png(PngArgs),
    /// Assemble a self-contained player bundle for a snapshot.
    Bundle(BundleArgs),
}

#[derive(Parser, Debug)]
struct SnapshotArgs {
    /// Exported state JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output snapshot JSON path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PngArgs {
    /// Snapshot JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Capture size as WIDTHxHEIGHT; repeatable. Defaults to the document size.
    #[arg(long = "size")]
    sizes: Vec<Size>,

    /// Root that the overlay images' `assets/` directory is resolved against. Defaults to the
    /// snapshot's directory.
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct BundleArgs {
    /// Snapshot JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the player files and assets are fetched from.
    #[arg(long)]
    root: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = match &cli.opts {
        Some(path) => SessionOpts::from_path(path)?,
        None => SessionOpts::default(),
    };
    match cli.cmd {
        Command::Snapshot(args) => cmd_snapshot(args, &opts),
        Command::Png(args) => cmd_png(args, opts),
        Command::Bundle(args) => cmd_bundle(args, &opts),
    }
}

fn read_json(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))
}

fn parent_or_cwd(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

fn cmd_snapshot(args: SnapshotArgs, opts: &SessionOpts) -> anyhow::Result<()> {
    let state = read_json(&args.in_path)?;
    let snapshot = export_snapshot(&state, &SceneCache::new(), opts.seed, opts.fuzz_policy)?;
    genscene::export::artifact::ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, snapshot.json)
        .with_context(|| format!("write snapshot '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_png(args: PngArgs, opts: SessionOpts) -> anyhow::Result<()> {
    let doc = SceneDocument::from_json(&read_json(&args.in_path)?)?;
    let sizes = if args.sizes.is_empty() {
        vec![doc.config.size]
    } else {
        args.sizes.clone()
    };
    let assets = args.assets.unwrap_or_else(|| parent_or_cwd(&args.in_path));

    let session = Session::new(
        opts,
        SessionDeps {
            fetcher: Rc::new(FsFetcher::new(assets)),
            sink: Rc::new(DirSink::new(&args.out)),
            surface: None,
        },
    );
    let failures = Rc::new(RefCell::new(Vec::new()));
    let saved = Rc::new(RefCell::new(Vec::new()));
    {
        let (failures, saved) = (Rc::clone(&failures), Rc::clone(&saved));
        session.outbound().subscribe(ANY_CHANNEL, move |msg| match msg {
            Outbound::Failure(reason) => failures.borrow_mut().push(reason.clone()),
            Outbound::ArtifactSaved(a) => saved.borrow_mut().push(a.file_name.clone()),
            _ => {}
        });
    }

    let product = doc.config.product.clone();
    let background = doc.config.background.clone();
    session.handle(Inbound::StartGui(to_wire(&doc)?));
    for size in sizes {
        session.handle(Inbound::TriggerSavePng(CaptureRequest {
            size,
            product: product.clone(),
            background: background.clone(),
        }));
        session.run_until_idle();
    }

    if let Some(reason) = failures.borrow().first() {
        anyhow::bail!("png export failed: {reason}");
    }
    for name in saved.borrow().iter() {
        eprintln!("wrote {}", args.out.join(name).display());
    }
    Ok(())
}

fn cmd_bundle(args: BundleArgs, opts: &SessionOpts) -> anyhow::Result<()> {
    let state = read_json(&args.in_path)?;
    let snapshot = export_snapshot(&state, &SceneCache::new(), opts.seed, opts.fuzz_policy)?;
    let fetcher = FsFetcher::new(&args.root);
    let artifact = futures::executor::block_on(export_bundle(&opts.bundle, &fetcher, &snapshot))?;
    DirSink::new(&args.out).save(&artifact)?;
    eprintln!("wrote {}", args.out.join(&artifact.file_name).display());
    Ok(())
}
