use std::f64::consts::PI;
use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use blocklab::{Boundary, FieldLab, GridConfig, MultiIndex, Side, Stencil};




#[derive(Debug, Parser)]
#[clap(version = "0.1", about = "Fill block halos and evaluate a Laplacian on every block")]
struct Opts {
    #[clap(short = 'b', long, default_value = "4")]
    blocks: i64,

    #[clap(short = 's', long, default_value = "32")]
    block_size: i64,

    #[clap(short = 'w', long, default_value = "1")]
    half_width: i64,

    #[clap(short = 't', long)]
    tensorial: bool,

    #[clap(short = 'l', long, default_value = "info")]
    log_level: LevelFilter,

    #[clap(long)]
    config: Option<String>,

    #[clap(long)]
    write_config: Option<String>,
}




/**
 * Summary of the Laplacian over one block
 */
#[derive(Clone, Copy, Debug)]
struct Summary {
    min: f64,
    max: f64,
    sum: f64,
    count: usize,
}




// ============================================================================
impl Summary {

    fn empty() -> Self {
        Self { min: f64::INFINITY, max: f64::NEG_INFINITY, sum: 0.0, count: 0 }
    }

    fn push(mut self, x: f64) -> Self {
        self.min = self.min.min(x);
        self.max = self.max.max(x);
        self.sum += x;
        self.count += 1;
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }
}




fn laplacian(lab: &FieldLab<f64, 2>) -> Summary {
    let di = MultiIndex::<2>::unit(0);
    let dj = MultiIndex::<2>::unit(1);

    lab.iter().fold(Summary::empty(), |summary, i| {
        let d2 = lab[i + di] + lab[i - di] + lab[i + dj] + lab[i - dj] - 4.0 * lab[i];
        summary.push(d2)
    })
}

fn default_config(opts: &Opts) -> Result<GridConfig<f64, 2>, blocklab::Error> {
    let width = opts.half_width.max(1);
    let stencil = Stencil::uniform(-width, width + 1, opts.tensorial)?;

    Ok(GridConfig::new(MultiIndex::splat(opts.blocks), MultiIndex::splat(opts.block_size), stencil)
        .with_boundaries(vec![
            Boundary::dirichlet(0, Side::Low, 0.0),
            Boundary::absorbing(0, Side::High),
            Boundary::symmetry(1, Side::Low),
            Boundary::periodic(1, Side::High),
        ]))
}




// ============================================================================
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();
    SimpleLogger::new().with_level(opts.log_level).init()?;
    info!("{:?}", opts);

    let config = match &opts.config {
        Some(path) => GridConfig::from_reader(std::io::BufReader::new(std::fs::File::open(path)?))?,
        None => default_config(&opts)?,
    };

    let mut grid = config.build_grid()?;
    let n = grid.global_space().dim();
    let (nx, ny) = (n[0] as f64, n[1] as f64);

    grid.fill(0, |i| {
        let x = (i[0] as f64 + 0.5) / nx;
        let y = (i[1] as f64 + 0.5) / ny;
        (2.0 * PI * x).sin() * (PI * y).cos()
    })?;

    let start = std::time::Instant::now();
    let summaries = grid.map_labs(0, config.stencil(), laplacian)?;
    let elapsed = start.elapsed().as_secs_f64();

    let total = summaries.into_iter().fold(Summary::empty(), Summary::merge);
    let footprint = grid.footprint();

    info!("blocks ............... {}", grid.blocks().len());
    info!("cells ................ {}", total.count);
    info!("laplacian min ........ {:+.6e}", total.min);
    info!("laplacian max ........ {:+.6e}", total.max);
    info!("laplacian mean ....... {:+.6e}", total.sum / total.count as f64);
    info!("field bytes .......... {} ({} used)", footprint.allocated, footprint.used);
    info!("seconds .............. {:.4}", elapsed);

    if let Some(path) = &opts.write_config {
        config.to_writer(std::io::BufWriter::new(std::fs::File::create(path)?))?;
        info!("wrote {}", path);
    }
    Ok(())
}
