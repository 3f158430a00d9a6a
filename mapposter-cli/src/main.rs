//! MapPoster CLI - Command-line interface
//!
//! This binary provides a command-line interface to the MapPoster library.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use mapposter::coord::GeoPoint;
use mapposter::logging;
use mapposter::options::{CustomLayerSpec, GenerationOptions, NetworkType};
use mapposter::poster::{AssemblerConfig, PosterAssembler, PosterRequest};
use mapposter::provider::ReqwestClient;
use mapposter::theme::{theme_summaries, Theme};

mod error;

use error::CliError;

#[derive(Debug, Clone, ValueEnum)]
enum NetworkArg {
    /// All routable ways in one graph
    All,
    /// Driveable roads only
    Drive,
    /// Cycleable ways only
    Bike,
    /// Walkable ways only
    Walk,
}

impl From<NetworkArg> for NetworkType {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::All => NetworkType::All,
            NetworkArg::Drive => NetworkType::Drive,
            NetworkArg::Bike => NetworkType::Bike,
            NetworkArg::Walk => NetworkType::Walk,
        }
    }
}

#[derive(Parser)]
#[command(name = "mapposter")]
#[command(version = mapposter::VERSION)]
#[command(about = "Generate themed city map posters from OpenStreetMap data", long_about = None)]
struct Args {
    /// City name, used for geocoding and the poster title
    #[arg(short, long, required_unless_present = "list_themes")]
    city: Option<String>,

    /// Country name, used for geocoding and the subtitle
    #[arg(short = 'C', long, required_unless_present = "list_themes")]
    country: Option<String>,

    /// Theme id; a missing theme file falls back to the built-in palette
    #[arg(short, long, default_value = "feature_based")]
    theme: String,

    /// Half-extent of the mapped area in meters
    #[arg(short, long, default_value = "29000")]
    distance: f64,

    /// Explicit center latitude; skips geocoding (requires --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Explicit center longitude; skips geocoding (requires --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Street network modes to include (repeatable; unioned)
    #[arg(long = "network", value_enum)]
    networks: Vec<NetworkArg>,

    /// Directory holding theme JSON files
    #[arg(long, default_value = "themes")]
    themes_dir: PathBuf,

    /// Directory holding the bundled fonts
    #[arg(long, default_value = "fonts")]
    fonts_dir: PathBuf,

    /// Directory posters are written to
    #[arg(long, default_value = "posters")]
    output_dir: PathBuf,

    /// Directory for cached upstream responses
    #[arg(long, default_value = "cache")]
    cache_dir: PathBuf,

    /// List available themes and exit
    #[arg(long)]
    list_themes: bool,

    /// Include the building footprint layer
    #[arg(long)]
    buildings: bool,

    /// Include the railway layer
    #[arg(long)]
    railways: bool,

    /// Skip the water layer
    #[arg(long)]
    no_water: bool,

    /// Skip the park layer
    #[arg(long)]
    no_parks: bool,

    /// Skip the top and bottom gradient fades
    #[arg(long)]
    no_gradients: bool,

    /// Bypass the response cache
    #[arg(long)]
    no_cache: bool,

    /// Paint all roads in one color and width instead of by hierarchy
    #[arg(long)]
    no_hierarchy: bool,

    /// Uniform road color override (hex, e.g. "#222222")
    #[arg(long)]
    road_color: Option<String>,

    /// Uniform road width in points when hierarchy widths are off
    #[arg(long)]
    road_width: Option<f32>,

    /// Building fill color override (hex)
    #[arg(long)]
    building_color: Option<String>,

    /// Building fill opacity in [0, 1]
    #[arg(long)]
    building_alpha: Option<f32>,

    /// Railway color override (hex)
    #[arg(long)]
    railway_color: Option<String>,

    /// Railway stroke width in points
    #[arg(long)]
    railway_width: Option<f32>,

    /// Custom layer spec as JSON (repeatable), e.g.
    /// '{"tag_key": "aeroway", "mode": "line", "color": "#888888"}'
    #[arg(long = "custom-layer")]
    custom_layers: Vec<String>,
}

impl Args {
    fn into_options(self) -> Result<(GenerationOptions, JobArgs), CliError> {
        let mut options = GenerationOptions::default();
        options.network_types = if self.networks.is_empty() {
            vec![NetworkType::All]
        } else {
            self.networks.iter().cloned().map(NetworkType::from).collect()
        };
        options.use_cache = !self.no_cache;
        options.show_water = !self.no_water;
        options.show_parks = !self.no_parks;
        options.show_gradients = !self.no_gradients;
        options.show_buildings = self.buildings;
        options.show_railways = self.railways;
        if self.no_hierarchy {
            options.use_road_hierarchy_colors = false;
            options.use_road_hierarchy_widths = false;
        }
        options.road_color = self.road_color;
        if let Some(width) = self.road_width {
            options.road_width = width;
        }
        options.building_color = self.building_color;
        if let Some(alpha) = self.building_alpha {
            options.building_alpha = alpha;
        }
        options.railway_color = self.railway_color;
        if let Some(width) = self.railway_width {
            options.railway_width = width;
        }
        for raw in &self.custom_layers {
            let spec: CustomLayerSpec = serde_json::from_str(raw)
                .map_err(|e| CliError::Usage(format!("invalid --custom-layer '{}': {}", raw, e)))?;
            options.custom_layers.push(spec);
        }

        let job = JobArgs {
            // required_unless_present guarantees these when not listing
            city: self.city.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
            theme_id: self.theme,
            distance: self.distance,
            point: match (self.lat, self.lon) {
                (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
                _ => None,
            },
            themes_dir: self.themes_dir,
            fonts_dir: self.fonts_dir,
            output_dir: self.output_dir,
            cache_dir: self.cache_dir,
        };
        Ok((options, job))
    }
}

struct JobArgs {
    city: String,
    country: String,
    theme_id: String,
    distance: f64,
    point: Option<GeoPoint>,
    themes_dir: PathBuf,
    fonts_dir: PathBuf,
    output_dir: PathBuf,
    cache_dir: PathBuf,
}

fn list_themes(themes_dir: &PathBuf) {
    let summaries = theme_summaries(themes_dir);
    if summaries.is_empty() {
        println!(
            "No themes found in '{}'; the built-in fallback palette is always available.",
            themes_dir.display()
        );
        return;
    }
    println!("Available themes:");
    for summary in summaries {
        match summary.description {
            Some(description) => {
                println!("  {:<20} {} - {}", summary.id, summary.display_name, description)
            }
            None => println!("  {:<20} {}", summary.id, summary.display_name),
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    if args.list_themes {
        list_themes(&args.themes_dir);
        return Ok(());
    }
    if args.distance <= 0.0 {
        return Err(CliError::Usage(format!(
            "--distance must be positive, got {}",
            args.distance
        )));
    }

    let (options, job) = args.into_options()?;
    let theme = Theme::load(&job.themes_dir, &job.theme_id)?;

    let client = ReqwestClient::new().map_err(|e| CliError::HttpClient(e.to_string()))?;
    let config = AssemblerConfig {
        output_dir: job.output_dir,
        fonts_dir: job.fonts_dir,
        cache_dir: job.cache_dir,
        ..AssemblerConfig::default()
    };
    let assembler = PosterAssembler::new(client, config)?;

    let mut request = PosterRequest::new(job.city, job.country, job.theme_id, job.distance);
    request.point = job.point;

    let poster = assembler.generate(&request, &theme, &options)?;
    println!("{}", poster.path.display());
    Ok(())
}

fn main() {
    logging::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        e.exit();
    }
}
