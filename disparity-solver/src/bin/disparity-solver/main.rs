mod result;

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use disparity_solver::core::backends::CspBackend;
use disparity_solver::core::backends::HostDevice;
use disparity_solver::core::backends::KernelDispatch;
use disparity_solver::core::backends::RowParallel;
use disparity_solver::core::backends::Sequential;
use disparity_solver::core::convert_case::Case;
use disparity_solver::core::labeling::find_disparity_map;
use disparity_solver::core::statistics::configure_statistic_logging;
use disparity_solver::core::statistics::log_statistic;
use disparity_solver::core::statistics::log_statistic_postfix;
use disparity_solver::core::statistics::should_log_statistics;
use disparity_solver::core::statistics::Statistic;
use disparity_solver::core::statistics::StatisticLogger;
use disparity_solver::core::DisparityGraph;
use disparity_solver::core::Image;
use disparity_solver::image_from_pgm;
use disparity_solver::image_to_pgm;
use disparity_solver::pgm_format;
use log::error;
use log::info;
use log::warn;
use log::LevelFilter;
use result::DisparityError;
use result::DisparityResult;

#[derive(Debug, Parser)]
#[command(
    help_template = "\
{before-help}{name} {version}
Authors: {author}
About: {about}

{usage-heading}\n{tab}{usage}

{all-args}{after-help}
",
    author,
    version,
    about,
    arg_required_else_help = true
)]
struct Args {
    /// The left image of the rectified stereo pair, in the plain PGM format.
    #[arg(short = 'l', long = "left-image")]
    left_image: PathBuf,

    /// The right image of the rectified stereo pair, in the plain PGM format.
    ///
    /// It should have the same dimensions and maximal intensity as the left image.
    #[arg(short = 'r', long = "right-image")]
    right_image: PathBuf,

    /// Where the disparity map is written, in the plain PGM format.
    ///
    /// The file is only written when a disparity map was found.
    #[arg(short = 'o', long = "output-image")]
    output_image: PathBuf,

    /// The number of disparities a pixel can be matched with.
    ///
    /// Defaults to the width of the left image.
    ///
    /// Possible values: usize
    #[arg(short = 'd', long = "disparity-levels", verbatim_doc_comment)]
    disparity_levels: Option<usize>,

    /// The weight of the squared intensity difference of matched pixels.
    ///
    /// Possible values: f64
    #[arg(short = 'c', long, default_value_t = 1.0, verbatim_doc_comment)]
    cleanness: f64,

    /// The weight of the squared disparity difference of neighbouring pixels.
    ///
    /// Possible values: f64
    #[arg(short = 's', long, default_value_t = 1.0, verbatim_doc_comment)]
    smoothness: f64,

    /// Determines how the constraint graph is relaxed.
    #[arg(short = 'p', long = "parallel", value_enum, ignore_case = true, default_value_t)]
    parallel: BackendType,

    /// The number of threads used by the parallel backend.
    ///
    /// Defaults to the number of available cores.
    #[arg(long)]
    threads: Option<usize>,

    /// Enables log message output from the solver.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Enables logging of statistics from the solver.
    #[arg(long = "log-statistics")]
    log_statistics: bool,
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendType {
    /// Relax the whole grid on a single thread.
    #[default]
    #[value(name = "cpu", alias = "sequential")]
    Cpu,
    /// Relax the rows of the grid on a thread pool.
    #[value(name = "omp", aliases = ["openmp", "parallel"])]
    Omp,
    /// Run the relaxation kernels on an OpenCL device.
    #[value(name = "cl", alias = "opencl")]
    OpenCl,
    /// Run the relaxation kernels on a CUDA device.
    #[value(name = "cuda")]
    Cuda,
}

fn configure_logging(verbose: bool, log_statistics: bool) {
    if log_statistics {
        configure_statistic_logging("%%%disparity-stat:", None, Some(Case::Camel), None);
    }
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .filter_level(level_filter)
        .target(env_logger::Target::Stderr)
        .init();
    info!("Logging successfully configured");
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("{}: {e}", e.category());
            std::process::exit(1);
        }
    }
}

fn run() -> DisparityResult<()> {
    let args = Args::parse();

    configure_logging(args.verbose, args.log_statistics);

    if disparity_solver::core::asserts::DISPARITY_ASSERT_LEVEL_DEFINITION
        >= disparity_solver::core::asserts::DISPARITY_ASSERT_MODERATE
    {
        warn!(
            "Potential performance degradation: the disparity assert level is set to {}, meaning many debug asserts are active which may result in performance degradation.",
            disparity_solver::core::asserts::DISPARITY_ASSERT_LEVEL_DEFINITION
        );
    };

    let left = read_image(&args.left_image)?;
    let right = read_image(&args.right_image)?;
    let disparity_levels = args.disparity_levels.unwrap_or(left.width());
    info!(
        "Matching {}x{} images with {disparity_levels} disparity levels",
        left.width(),
        left.height()
    );

    let graph = DisparityGraph::new(
        left,
        right,
        disparity_levels,
        args.cleanness,
        args.smoothness,
    )?;

    let mut backend = create_backend(args.parallel, args.threads)?;
    info!("Relaxing with the {} backend", backend.name());

    let disparity_map = find_disparity_map(&graph, backend.as_mut())?;

    if should_log_statistics() {
        log_statistic("threshold", disparity_map.threshold);
        disparity_map
            .statistics
            .log(StatisticLogger::new(["labeling"]));
        backend.log_statistics(StatisticLogger::new(["backend"]));
        log_statistic_postfix();
    }

    write_image(&args.output_image, disparity_map.image)
}

fn create_backend(
    backend_type: BackendType,
    threads: Option<usize>,
) -> DisparityResult<Box<dyn CspBackend>> {
    if threads.is_some() && backend_type != BackendType::Omp {
        warn!("The number of threads is only used by the parallel backend.");
    }

    let backend: Box<dyn CspBackend> = match backend_type {
        BackendType::Cpu => Box::new(Sequential::new()),
        BackendType::Omp => Box::new(RowParallel::new(threads)?),
        BackendType::OpenCl | BackendType::Cuda => {
            warn!("No {backend_type:?} device is linked in, the kernels run on the host instead.");
            Box::new(KernelDispatch::new(HostDevice::new()))
        }
    };
    Ok(backend)
}

fn read_image(path: &Path) -> DisparityResult<Image> {
    let file = File::open(path).map_err(|e| DisparityError::open_image(path, e))?;
    let pgm = pgm_format::decode(file).map_err(|e| DisparityError::invalid_pgm(path, e))?;
    image_from_pgm(pgm).map_err(|e| DisparityError::invalid_image(path, e))
}

/// The image is encoded in memory first so that a failure never leaves a partial file behind.
fn write_image(path: &Path, image: Image) -> DisparityResult<()> {
    let mut encoded = Vec::new();
    pgm_format::encode(&image_to_pgm(image), &mut encoded)?;
    std::fs::write(path, encoded)?;
    info!("Disparity map written to {}", path.display());
    Ok(())
}
