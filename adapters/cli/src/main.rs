#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that authors a battle map from arguments and reports
//! line of sight or movement costs on it.

mod feature_tags;

use std::{fmt, thread, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use skirmish_core::{
    Creature, CreatureSize, Dimension, Line, Location, MapFeature, Point, Polygon, Rectangle,
};
use skirmish_grid::{BattleMap, SquareColor};
use skirmish_system_movement::{compute_movement, MovementMap};
use skirmish_system_visibility::{LosCalculator, LosConfig, LosOutcome};

use crate::feature_tags::{feature_for_tag, FEATURE_TAGS};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Line of sight and movement on skirmish battle maps
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    map: MapArgs,
    /// Worker threads for line of sight; defaults to the available parallelism
    #[arg(long)]
    threads: Option<usize>,
    /// Random trials per square pair once the fixed samples fail
    #[arg(long)]
    random_trials: Option<u32>,
    /// Seed for the random trials
    #[arg(long)]
    seed: Option<u64>,
    /// Smoke blocks sight like a closed square of walls
    #[arg(long)]
    smoke_blocks_los: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

/// Map authoring arguments.
#[derive(Debug, Args)]
struct MapArgs {
    /// Map size as WIDTHxHEIGHT
    #[arg(long, default_value = "13x12", value_parser = parse_dimension)]
    size: Dimension,
    /// Solid squares, as a location such as `C4` or a range such as `C4-E7`
    #[arg(long, value_name = "RANGE")]
    solid: Vec<Rectangle>,
    /// Wall segment in map coordinates
    #[arg(long, value_name = "X1,Y1,X2,Y2", value_parser = parse_line)]
    wall: Vec<Line>,
    /// Thick wall outline in map coordinates, such as `1,1;4,1;4,3`
    #[arg(long, value_name = "X,Y;X,Y;...", value_parser = parse_polygon)]
    polygon: Vec<Polygon>,
    /// Terrain feature over a range, such as `forest:B2-C5`
    #[arg(long, value_name = "TAG:RANGE", value_parser = parse_feature)]
    feature: Vec<FeatureArea>,
    /// Square colour over a range, such as `B2-C5:3a7d44`
    #[arg(long, value_name = "RANGE:RRGGBB", value_parser = parse_paint)]
    color: Vec<Paint>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Squares visible from one or more creatures
    Los {
        /// Square of a source creature; repeat for several creatures
        #[arg(long, required = true)]
        source: Vec<Location>,
        /// Size of every source creature
        #[arg(long, value_enum, default_value_t = SizeArg::Medium)]
        creature_size: SizeArg,
    },
    /// Movement cost from a creature to every square
    Movement {
        /// Square of the creature
        #[arg(long)]
        from: Location,
        /// Size of the creature
        #[arg(long, value_enum, default_value_t = SizeArg::Medium)]
        creature_size: SizeArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SizeArg {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl From<SizeArg> for CreatureSize {
    fn from(size: SizeArg) -> Self {
        match size {
            SizeArg::Tiny => Self::Tiny,
            SizeArg::Small => Self::Small,
            SizeArg::Medium => Self::Medium,
            SizeArg::Large => Self::Large,
            SizeArg::Huge => Self::Huge,
            SizeArg::Gargantuan => Self::Gargantuan,
            SizeArg::Colossal => Self::Colossal,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct FeatureArea {
    feature: MapFeature,
    area: Rectangle,
}

#[derive(Clone, Copy, Debug)]
struct Paint {
    area: Rectangle,
    color: SquareColor,
}

fn parse_dimension(value: &str) -> Result<Dimension, String> {
    let (width, height) = value
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width = width.trim().parse().map_err(|_| format!("bad width `{width}`"))?;
    let height = height
        .trim()
        .parse()
        .map_err(|_| format!("bad height `{height}`"))?;
    Dimension::new(width, height).map_err(|error| error.to_string())
}

fn parse_line(value: &str) -> Result<Line, String> {
    let coords = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| format!("bad coordinate in `{value}`: {error}"))?;
    let [x1, y1, x2, y2] = coords[..] else {
        return Err(format!("expected X1,Y1,X2,Y2, got `{value}`"));
    };
    Line::from_coords(x1, y1, x2, y2).map_err(|error| error.to_string())
}

fn parse_feature(value: &str) -> Result<FeatureArea, String> {
    let (tag, area) = value
        .split_once(':')
        .ok_or_else(|| format!("expected TAG:RANGE, got `{value}`"))?;
    let feature = feature_for_tag(tag).ok_or_else(|| {
        let known: Vec<&str> = FEATURE_TAGS.iter().map(|(name, _)| *name).collect();
        format!("unknown feature `{tag}`; expected one of {}", known.join(", "))
    })?;
    let area = area
        .parse::<Rectangle>()
        .map_err(|error| error.to_string())?;
    Ok(FeatureArea { feature, area })
}

fn parse_polygon(value: &str) -> Result<Polygon, String> {
    let vertices = value
        .split(';')
        .map(|vertex| {
            let (x, y) = vertex
                .split_once(',')
                .ok_or_else(|| format!("expected X,Y, got `{vertex}`"))?;
            let coordinate = |text: &str| {
                text.trim()
                    .parse::<f64>()
                    .map_err(|error| format!("bad coordinate in `{vertex}`: {error}"))
            };
            Ok(Point::new(coordinate(x)?, coordinate(y)?))
        })
        .collect::<Result<Vec<_>, String>>()?;
    Polygon::new(vertices).map_err(|error| error.to_string())
}

fn parse_paint(value: &str) -> Result<Paint, String> {
    let (area, hex) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected RANGE:RRGGBB, got `{value}`"))?;
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("expected six hex digits, got `{hex}`"));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| format!("bad colour `{hex}`"))
    };
    let color = SquareColor::new(channel(0..2)?, channel(2..4)?, channel(4..6)?);
    let area = area
        .parse::<Rectangle>()
        .map_err(|error| error.to_string())?;
    Ok(Paint { area, color })
}

fn build_map(args: &MapArgs) -> Result<BattleMap> {
    let mut map = BattleMap::new(args.size, "command line");
    for area in &args.solid {
        map.mark_solid_area(area)
            .with_context(|| format!("solid area {area} does not fit on the map"))?;
    }
    for wall in &args.wall {
        map.add_wall(*wall)
            .with_context(|| format!("wall {wall} does not fit on the map"))?;
    }
    for polygon in &args.polygon {
        map.add_polygon(polygon).with_context(|| {
            format!(
                "polygon with {} vertices does not fit on the map",
                polygon.vertices().len()
            )
        })?;
    }
    for FeatureArea { feature, area } in &args.feature {
        for location in area.locations() {
            let _ = map
                .add_feature(location, *feature)
                .with_context(|| format!("{feature:?} area {area} does not fit on the map"))?;
        }
    }
    for Paint { area, color } in &args.color {
        for location in area.locations() {
            map.set_color(location, *color)
                .with_context(|| format!("coloured area {area} does not fit on the map"))?;
        }
    }
    Ok(map)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let map = build_map(&cli.map)?;
    let report = match &cli.command {
        Command::Los {
            source,
            creature_size,
        } => {
            let creatures: Vec<Creature> = source
                .iter()
                .map(|location| Creature::new((*creature_size).into(), *location))
                .collect();
            for creature in &creatures {
                if !map.can_place_creature(creature) {
                    log::warn!(
                        "{:?} creature at {} overlaps walls or solid rock",
                        creature.size(),
                        creature.location()
                    );
                }
            }
            let outcome = run_los(&cli, &map, &creatures)?;
            los_report(&cli, &map, &creatures, &outcome)?
        }
        Command::Movement {
            from,
            creature_size,
        } => {
            let creature = Creature::new((*creature_size).into(), *from);
            let movement = compute_movement(&map, &creature)
                .with_context(|| format!("cannot compute movement from {from}"))?;
            movement_report(&cli, &map, &creature, &movement)?
        }
    };
    print!("{report}");
    Ok(())
}

fn run_los(cli: &Cli, map: &BattleMap, creatures: &[Creature]) -> Result<LosOutcome> {
    let mut config = LosConfig::default();
    if let Some(threads) = cli.threads {
        config = config.with_workers(threads);
    }
    if let Some(random_trials) = cli.random_trials {
        config = config.with_random_trials(random_trials);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    let calculator = LosCalculator::new(config).context("failed to start line-of-sight workers")?;
    let progress = calculator.progress();

    thread::scope(|scope| {
        let worker = scope.spawn(|| calculator.compute_los(map, creatures, cli.smoke_blocks_los));
        let mut reported = None;
        while !worker.is_finished() {
            thread::sleep(POLL_INTERVAL);
            let percent = progress.percent_done();
            if reported != Some(percent) {
                log::info!("{percent}% done");
                reported = Some(percent);
            }
        }
        worker
            .join()
            .map_err(|_| anyhow!("line-of-sight computation panicked"))?
            .context("line-of-sight computation failed")
    })
}

#[derive(Debug, Serialize)]
struct PaintedSquare {
    location: String,
    color: String,
}

/// Squares whose colour differs from the default white.
fn painted_squares(map: &BattleMap) -> Vec<PaintedSquare> {
    map.dimension()
        .locations()
        .filter_map(|location| {
            let color = map.get(location)?.color();
            (color != SquareColor::WHITE).then(|| PaintedSquare {
                location: location.to_string(),
                color: format!("#{:02x}{:02x}{:02x}", color.red(), color.green(), color.blue()),
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct LosReport {
    size: Dimension,
    painted: Vec<PaintedSquare>,
    sources: Vec<String>,
    visible: Vec<String>,
    tasks: usize,
    random_hits: usize,
    elapsed_seconds: f64,
}

#[derive(Debug, Serialize)]
struct CostEntry {
    location: String,
    cost: u32,
}

#[derive(Debug, Serialize)]
struct MovementReport {
    size: Dimension,
    painted: Vec<PaintedSquare>,
    from: String,
    creature_size: CreatureSize,
    costs: Vec<CostEntry>,
}

fn los_report(
    cli: &Cli,
    map: &BattleMap,
    creatures: &[Creature],
    outcome: &LosOutcome,
) -> Result<String> {
    let los = outcome.map();
    if cli.json {
        let report = LosReport {
            size: map.dimension(),
            painted: painted_squares(map),
            sources: creatures
                .iter()
                .map(|creature| creature.location().to_string())
                .collect(),
            visible: los.visible().iter().map(ToString::to_string).collect(),
            tasks: outcome.tasks(),
            random_hits: outcome.random_hits(),
            elapsed_seconds: outcome.elapsed().as_secs_f64(),
        };
        return Ok(serde_json::to_string_pretty(&report)? + "\n");
    }

    let mut text = String::new();
    draw_grid(&mut text, map.dimension(), 1, |location| {
        let mark = if creatures.iter().any(|creature| creature.occupies(location)) {
            '@'
        } else if map.is_solid(location) {
            '#'
        } else if los.get(location) {
            'o'
        } else {
            '.'
        };
        mark.to_string()
    })?;
    text.push_str(&format!(
        "{} squares visible, {} tasks, {} random hits, {:.3}s\n",
        los.count(),
        outcome.tasks(),
        outcome.random_hits(),
        outcome.elapsed().as_secs_f64()
    ));
    Ok(text)
}

fn movement_report(
    cli: &Cli,
    map: &BattleMap,
    creature: &Creature,
    movement: &MovementMap,
) -> Result<String> {
    if cli.json {
        let report = MovementReport {
            size: map.dimension(),
            painted: painted_squares(map),
            from: creature.location().to_string(),
            creature_size: creature.size(),
            costs: movement
                .reachable()
                .map(|(location, cost)| CostEntry {
                    location: location.to_string(),
                    cost,
                })
                .collect(),
        };
        return Ok(serde_json::to_string_pretty(&report)? + "\n");
    }

    let mut text = String::new();
    draw_grid(&mut text, map.dimension(), 3, |location| {
        if map.is_solid(location) {
            "#".to_owned()
        } else {
            movement
                .cost(location)
                .map_or_else(|| "-".to_owned(), |cost| cost.to_string())
        }
    })?;
    text.push_str(&format!(
        "{} squares reachable from {}\n",
        movement.reachable().count(),
        creature.location()
    ));
    Ok(text)
}

/// Draws the map top row first, one cell of `width` characters per square.
fn draw_grid(
    out: &mut impl fmt::Write,
    dimension: Dimension,
    width: usize,
    cell: impl Fn(Location) -> String,
) -> fmt::Result {
    for row in (0..dimension.height()).rev() {
        write!(out, "{:>2} ", char::from(b'A' + row as u8))?;
        for location in dimension.locations().filter(|location| location.row() == row) {
            write!(out, "{:>width$}", cell(location))?;
        }
        writeln!(out)?;
    }
    write!(out, "   ")?;
    for column in 1..=dimension.width() {
        write!(out, "{:>width$}", column % 10)?;
    }
    writeln!(out)
}
