//! `fw` - runs, checks and feeds the closure engines from the command line.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fw_core::{
    negative_cycle_nodes, ClosureBackend, DenseMatrix, ElementKind, Engine, EngineConfig, Matrix,
    SemiringKind, Variant, Weight,
};
use fw_gen::{generate, max_edges, Density, GeneratorConfig};
use fw_io::{compare_files, save_matrix, write_matrix, MatrixFile, DEFAULT_PRECISION};

#[derive(Parser, Debug)]
#[command(name = "fw")]
#[command(author, version, about = "Generalized Floyd-Warshall closure engines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the closure of a matrix file.
    Run(RunArgs),
    /// Compare two matrix files cell by cell.
    ///
    /// Exits with 0 when equal, 1 when different and 2 on error.
    Compare(CompareArgs),
    /// Write a random graph as a matrix file.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Input matrix file
    input: PathBuf,

    /// Output matrix file
    output: PathBuf,

    /// shortest-path, max-min or transitive-closure
    #[arg(short, long, default_value = "shortest-path", env = "FW_SEMIRING")]
    semiring: SemiringKind,

    /// reference, unrolled, tiled or lane-batched
    #[arg(short, long, default_value = "unrolled", env = "FW_VARIANT")]
    variant: Variant,

    /// Cell storage: f16, f32, f64, bool or bit
    #[arg(short, long, env = "FW_ELEMENT")]
    element: Option<ElementKind>,

    /// Tile edge length; must divide the node count
    #[arg(short, long, env = "FW_TILE")]
    tile: Option<usize>,

    /// Rows per register block of the unrolled kernel
    #[arg(long, default_value_t = 4, env = "FW_UNROLL_ROWS")]
    unroll_rows: usize,

    /// Require lane-aligned rows and tiles (lane-batched only)
    #[arg(long, env = "FW_ALIGNED")]
    aligned: bool,

    /// Store booleans eight per byte (transitive closure only)
    #[arg(long)]
    packed: bool,

    /// Grow the matrix to a multiple of the tile size before running
    #[arg(long)]
    pad: bool,

    /// Also run the reference engine and fail on any difference
    #[arg(long)]
    verify: bool,
}

#[derive(Args, Debug)]
struct CompareArgs {
    a: PathBuf,
    b: PathBuf,

    /// Largest absolute difference still counted as equal
    #[arg(short, long, default_value_t = DEFAULT_PRECISION)]
    precision: f64,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(short, long, default_value_t = 30)]
    nodes: usize,

    /// Exact edge count; overrides --density
    #[arg(short, long)]
    edges: Option<usize>,

    /// sparse, log-squared, dense or half
    #[arg(short, long, default_value = "log-squared")]
    density: Density,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    directed: bool,

    #[arg(long, default_value_t = 0.0)]
    min_weight: f64,

    #[arg(long, default_value_t = 10.0)]
    max_weight: f64,

    /// Draw integer weights so path sums are exact
    #[arg(long)]
    integral: bool,

    /// Make every node reach every other
    #[arg(long)]
    connected: bool,

    /// Redraw until no negative cycle remains
    #[arg(long)]
    no_neg_cycle: bool,

    #[arg(long, default_value_t = 0, env = "FW_SEED")]
    seed: u64,

    /// Instance whose "no edge" value absent cells take
    #[arg(short, long, default_value = "shortest-path")]
    semiring: SemiringKind,

    /// Output file; stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run(&args).map(|()| ExitCode::SUCCESS),
        Command::Compare(args) => compare(&args).map(|equal| {
            if equal {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }),
        Command::Generate(args) => generate_graph(&args).map(|()| ExitCode::SUCCESS),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Storage form implied by the flags.
fn element_for(args: &RunArgs) -> anyhow::Result<ElementKind> {
    if args.packed {
        if args.semiring != SemiringKind::TransitiveClosure {
            bail!("--packed needs --semiring transitive-closure");
        }
        return Ok(ElementKind::Bit);
    }
    Ok(match (args.element, args.semiring) {
        (Some(e), _) => e,
        (None, SemiringKind::TransitiveClosure) => ElementKind::Bool,
        (None, _) => ElementKind::F32,
    })
}

fn engine_config(args: &RunArgs) -> EngineConfig {
    let config = EngineConfig::default()
        .with_unroll_rows(args.unroll_rows)
        .with_aligned_loads(args.aligned);
    match args.tile {
        Some(tile) => config.with_tile_size(tile),
        None => config,
    }
}

fn run(args: &RunArgs) -> anyhow::Result<()> {
    let element = element_for(args)?;
    let engine = Engine::new(args.variant, engine_config(args))?;

    let file = MatrixFile::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let mut matrix = file
        .matrix(args.semiring, element)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let n = matrix.n();
    info!(n, semiring = %args.semiring, %element, variant = %args.variant, "loaded matrix");

    if args.pad {
        match args.tile {
            Some(tile) if tile > 0 => {
                let padded_n = DenseMatrix::<f32>::padded_size(n, tile);
                if padded_n != n {
                    debug!(from = n, to = padded_n, "padding to tile multiple");
                    matrix = matrix.padded(padded_n, args.semiring)?;
                }
            }
            _ => warn!("--pad has no effect without --tile"),
        }
    }

    let expected = if args.verify {
        let mut m = matrix.try_clone()?;
        Engine::reference().run(&mut m, args.semiring)?;
        Some(m)
    } else {
        None
    };

    let start = Instant::now();
    engine.run(&mut matrix, args.semiring)?;
    let elapsed = start.elapsed();
    info!(
        engine = engine.name(),
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "closure complete"
    );

    if let Some(expected) = expected {
        if !agrees(&matrix, &expected, DEFAULT_PRECISION) {
            bail!("{} disagrees with the reference engine", engine.name());
        }
        info!("verified against reference");
    }

    if args.semiring == SemiringKind::ShortestPath {
        let cycles = negative_cycles(&matrix);
        if !cycles.is_empty() {
            warn!(nodes = ?cycles, "negative cycle detected; distances are not meaningful");
        }
    }

    let out = if matrix.n() != n { matrix.cropped(n)? } else { matrix };
    save_matrix(&args.output, &out, args.semiring)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(())
}

/// Exact equality for booleans, absolute tolerance for weights.
fn agrees(a: &Matrix, b: &Matrix, precision: f64) -> bool {
    fn close<T: Weight>(a: &DenseMatrix<T>, b: &DenseMatrix<T>, precision: f64) -> bool {
        a.n() == b.n()
            && a.as_slice()
                .iter()
                .zip(b.as_slice())
                .all(|(x, y)| fw_io::compare::cells_match(x.to_f64(), y.to_f64(), precision))
    }
    match (a, b) {
        (Matrix::F16(x), Matrix::F16(y)) => close(x, y, precision),
        (Matrix::F32(x), Matrix::F32(y)) => close(x, y, precision),
        (Matrix::F64(x), Matrix::F64(y)) => close(x, y, precision),
        _ => a == b,
    }
}

fn negative_cycles(m: &Matrix) -> Vec<usize> {
    match m {
        Matrix::F16(d) => negative_cycle_nodes(d),
        Matrix::F32(d) => negative_cycle_nodes(d),
        Matrix::F64(d) => negative_cycle_nodes(d),
        Matrix::Bool(_) | Matrix::Packed(_) => Vec::new(),
    }
}

fn compare(args: &CompareArgs) -> anyhow::Result<bool> {
    let result = compare_files(&args.a, &args.b, args.precision)?;
    for m in result.mismatches.iter().take(10) {
        println!("({}, {}): {} != {}", m.row, m.col, m.left, m.right);
    }
    if result.mismatches.len() > 10 {
        println!("... {} more", result.mismatches.len() - 10);
    }
    let equal = result.is_equal();
    info!(n = result.n, mismatches = result.mismatches.len(), equal, "compared");
    Ok(equal)
}

fn generator_config(args: &GenerateArgs) -> GeneratorConfig {
    let edges = args.edges.unwrap_or_else(|| {
        args.density
            .edges(args.nodes)
            .min(max_edges(args.nodes, args.directed))
    });
    GeneratorConfig::new(args.nodes, edges)
        .with_directed(args.directed)
        .with_weights(args.min_weight, args.max_weight)
        .with_integral(args.integral)
        .with_connected(args.connected)
        .with_no_negative_cycle(args.no_neg_cycle)
        .with_seed(args.seed)
}

fn generate_graph(args: &GenerateArgs) -> anyhow::Result<()> {
    let graph = generate(&generator_config(args))?;
    let matrix: Matrix = match args.semiring {
        SemiringKind::ShortestPath => graph.to_weights()?.into(),
        SemiringKind::MaxMin => graph.to_capacities()?.into(),
        SemiringKind::TransitiveClosure => graph.to_reachability()?.into(),
    };
    match &args.output {
        Some(path) => write_file(path, &matrix, args.semiring),
        None => {
            let mut out = BufWriter::new(io::stdout().lock());
            write_matrix(&mut out, &matrix, args.semiring)?;
            out.flush()?;
            Ok(())
        }
    }
}

fn write_file(path: &Path, m: &Matrix, kind: SemiringKind) -> anyhow::Result<()> {
    save_matrix(path, m, kind).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), n = m.n(), "wrote matrix");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run_args(input: PathBuf, output: PathBuf, extra: &[&str]) -> RunArgs {
        let mut argv = vec![
            "fw".to_string(),
            "run".to_string(),
            input.display().to_string(),
            output.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_padded_tiled_verify() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "3\n0,1,\n,0,1\n,,0\n").unwrap();

        let args = run_args(
            input,
            output.clone(),
            &["--variant", "tiled", "--tile", "2", "--pad", "--verify"],
        );
        run(&args).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "3\n0,1,2\n,0,1\n,,0\n");
    }

    #[test]
    fn test_run_packed_requires_transitive_closure() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path().join("a"), dir.path().join("b"), &["--packed"]);
        assert!(run(&args).unwrap_err().to_string().contains("--packed"));

        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "3\n,1,\n,,1\n,,\n").unwrap();
        let args = run_args(
            input,
            output.clone(),
            &["--semiring", "tc", "--packed", "--variant", "unrolled"],
        );
        run(&args).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "3\n,1,1\n,,1\n,,\n");
    }

    #[test]
    fn test_tiled_without_tile_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "1\n0\n").unwrap();
        let args = run_args(input, dir.path().join("out.csv"), &["--variant", "tiled"]);
        assert!(run(&args).is_err());
    }

    #[test]
    fn test_generate_then_compare() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        for path in [&a, &b] {
            let cli = Cli::try_parse_from([
                "fw",
                "generate",
                "--nodes",
                "12",
                "--density",
                "dense",
                "--integral",
                "--seed",
                "5",
                "--output",
                path.to_str().unwrap(),
            ])
            .unwrap();
            match cli.command {
                Command::Generate(args) => generate_graph(&args).unwrap(),
                other => panic!("unexpected {other:?}"),
            }
        }
        let args = CompareArgs {
            a: a.clone(),
            b: b.clone(),
            precision: DEFAULT_PRECISION,
        };
        assert!(compare(&args).unwrap());

        fs::write(&b, "1\n0\n").unwrap();
        assert!(compare(&CompareArgs { a, b, precision: DEFAULT_PRECISION }).is_err());
    }

    #[test]
    fn test_generate_without_negative_cycles() {
        let cli = Cli::try_parse_from([
            "fw",
            "generate",
            "--nodes",
            "8",
            "--edges",
            "20",
            "--min-weight=-3",
            "--max-weight",
            "6",
            "--integral",
            "--no-neg-cycle",
            "--seed",
            "2",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let cfg = generator_config(&args);
        assert!(cfg.no_negative_cycle);
        let graph = generate(&cfg).unwrap();
        assert!(!graph.has_negative_cycle().unwrap());
    }

    #[test]
    fn test_agrees_tolerance() {
        let a: Matrix = DenseMatrix::from_vec(1, vec![1.0f32]).unwrap().into();
        let b: Matrix = DenseMatrix::from_vec(1, vec![1.005f32]).unwrap().into();
        let c: Matrix = DenseMatrix::from_vec(1, vec![1.5f32]).unwrap().into();
        assert!(agrees(&a, &b, DEFAULT_PRECISION));
        assert!(!agrees(&a, &c, DEFAULT_PRECISION));
    }
}
