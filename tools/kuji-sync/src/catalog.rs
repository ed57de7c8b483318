//! The game catalog: every game the sync knows, and where its results live.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use kuji_core::{GameSpec, Source};

/// Results site serving one HTML page per game and year.
pub const LOTTERY_NET: &str = "https://www.lottery.net";

/// URL of one year page of an HTML game.
pub fn page_url(base: &str, path: &str, slug: &str, year: i32) -> String {
    format!("{}/{path}/{slug}/{year}", base.trim_end_matches('/'))
}

fn game(id: &str, name: &str, picks: usize, max: u8, bonus_max: Option<u8>, source: Source) -> GameSpec {
    GameSpec {
        id: id.to_string(),
        name: name.to_string(),
        picks,
        max,
        bonus: bonus_max.is_some(),
        bonus_max,
        source,
    }
}

fn json(id: &str, name: &str, url: &str, picks: usize, max: u8, bonus_max: u8) -> GameSpec {
    game(id, name, picks, max, Some(bonus_max), Source::Json { url: url.to_string() })
}

fn csv(id: &str, name: &str, url: &str, picks: usize, max: u8) -> GameSpec {
    game(id, name, picks, max, None, Source::Csv { url: url.to_string() })
}

fn html(id: &str, name: &str, path: &str, picks: usize, max: u8) -> GameSpec {
    game(
        id,
        name,
        picks,
        max,
        None,
        Source::Html {
            path: path.to_string(),
            slug: "numbers".to_string(),
            alt_slug: None,
            start_year: None,
        },
    )
}

fn with_bonus(mut spec: GameSpec, bonus_max: u8) -> GameSpec {
    spec.bonus = true;
    spec.bonus_max = Some(bonus_max);
    spec
}

fn with_alt_slug(mut spec: GameSpec, alt: &str) -> GameSpec {
    if let Source::Html { alt_slug, .. } = &mut spec.source {
        *alt_slug = Some(alt.to_string());
    }
    spec
}

fn with_start_year(mut spec: GameSpec, year: i32) -> GameSpec {
    if let Source::Html { start_year, .. } = &mut spec.source {
        *start_year = Some(year);
    }
    spec
}

/// The built-in catalog.
pub fn builtin() -> Vec<GameSpec> {
    vec![
        // open-data JSON
        json("powerball", "Powerball", "https://data.ny.gov/resource/d6yy-54nr.json?$limit=50&$order=draw_date%20DESC", 5, 69, 26),
        json("mega", "Mega Millions", "https://data.ny.gov/resource/5xaw-6ayf.json?$limit=50&$order=draw_date%20DESC", 5, 70, 24),
        json("ny6", "Lotto New York", "https://data.ny.gov/resource/6nbc-h7bj.json?$limit=50&$order=draw_date%20DESC", 6, 59, 59),
        // open-data CSV, drawn twice daily
        csv("ny", "Take 5 New York", "https://data.ny.gov/api/views/dg63-4siq/rows.csv?accessType=DOWNLOAD", 5, 39),
        // multi-state
        with_bonus(html("lottoamerica", "Lotto America", "lotto-america", 5, 52), 10),
        // pick 5
        html("az", "The Pick Arizona", "arizona/the-pick", 6, 44),
        html("ar", "Natural State Jackpot", "arkansas/natural-state-jackpot", 5, 39),
        html("ca", "Fantasy 5 California", "california/fantasy-5", 5, 39),
        html("co", "Cash 5 Colorado", "colorado/cash-5", 5, 32),
        html("ct", "Cash5 Connecticut", "connecticut/cash-5", 5, 35),
        html("fl", "Fantasy 5 Florida", "florida/fantasy-5", 5, 36),
        html("ga", "Fantasy 5 Georgia", "georgia/fantasy-5", 5, 42),
        html("id5", "Idaho Cash", "idaho/cash", 5, 45),
        html("il", "Lucky Day Lotto", "illinois/lucky-day-lotto-evening", 5, 45),
        html("in5", "Cash 5 Indiana", "indiana/cash-5", 5, 45),
        html("la", "Easy 5 Louisiana", "louisiana/easy-5", 5, 37),
        with_bonus(html("md", "Bonus Match 5 Maryland", "maryland/bonus-match-5", 5, 39), 39),
        html("ma", "Mass Cash", "massachusetts/mass-cash", 5, 35),
        html("mi", "Fantasy 5 Michigan", "michigan/fantasy-5", 5, 39),
        html("mn_g5", "Gopher 5 Minnesota", "minnesota/gopher-5", 5, 47),
        html("mn_n5", "Northstar Cash", "minnesota/north-5", 5, 31),
        html("ms", "Match 5 Mississippi", "mississippi/match-5", 5, 35),
        html("mo", "Show Me Cash", "missouri/show-me-cash", 5, 39),
        with_start_year(html("mt", "Montana Cash", "montana/cash", 5, 45), 2014),
        html("ne", "Pick 5 Nebraska", "nebraska/pick-5", 5, 40),
        with_start_year(html("tristate", "Gimme 5", "new-hampshire/gimme-5", 5, 39), 2012),
        with_start_year(html("ok", "Cash 5 Oklahoma", "oklahoma/cash-5", 5, 36), 2010),
        html("nj5", "Cash Five NJ", "new-jersey/cash-5", 5, 45),
        with_alt_slug(html("nm", "Roadrunner Cash", "new-mexico/roadrunner-cash", 5, 37), "results"),
        html("nc", "Cash 5 North Carolina", "north-carolina/cash-5", 5, 43),
        html("oh5", "Rolling Cash 5 Ohio", "ohio/rolling-cash-5", 5, 39),
        html("pa", "Cash 5 Pennsylvania", "pennsylvania/cash-5", 5, 43),
        html("ri", "Wild Money RI", "rhode-island/wild-money", 5, 38),
        html("sc", "Palmetto Cash 5", "south-carolina/palmetto-cash-5", 5, 42),
        html("sd", "Dakota Cash", "south-dakota/cash", 5, 35),
        html("tn", "Tennessee Cash", "tennessee/cash", 5, 38),
        html("tx5", "Cash Five Texas", "texas/cash-five", 5, 35),
        html("va", "Cash 5 Virginia", "virginia/cash-5", 5, 45),
        html("wa", "Hit 5 Washington", "washington/hit-5", 5, 42),
        html("wi5", "Badger 5 Wisconsin", "wisconsin/badger-5", 5, 31),
        html("wy", "Cowboy Draw Wyoming", "wyoming/cowboy-draw", 5, 45),
        // pick 6 / lotto
        with_bonus(html("ca6", "SuperLotto Plus CA", "california/superlotto-plus", 5, 47), 27),
        html("ct6", "Lotto Connecticut", "connecticut/lotto", 6, 44),
        html("fl6", "Lotto Florida", "florida/lotto", 6, 53),
        html("nj6", "Pick-6 NJ", "new-jersey/pick-6", 6, 49),
        html("oh6", "Classic Lotto Ohio", "ohio/classic-lotto", 6, 49),
        html("or6", "Megabucks Oregon", "oregon/megabucks", 6, 48),
        html("pa6", "Match 6 Pennsylvania", "pennsylvania/match-6-lotto", 6, 49),
        html("tx6", "Lotto Texas", "texas/lotto", 6, 54),
        html("wa6", "Lotto Washington", "washington/lotto", 6, 49),
        html("wi6", "Megabucks Wisconsin", "wisconsin/megabucks", 6, 49),
        html("wi6s", "SuperCash Wisconsin", "wisconsin/super-cash", 6, 39),
    ]
}

/// Loads the catalog from `path`, or the built-in one, keeps only the games
/// named in `only` (all when empty) and checks every entry.
///
/// # Errors
///
/// Fails on an unreadable or malformed file, an invalid or duplicated
/// game, or an `only` id that is not in the catalog.
pub fn load(path: Option<&Path>, only: &[String]) -> Result<Vec<GameSpec>> {
    let games = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading game catalog {}", path.display()))?;
            serde_json::from_str::<Vec<GameSpec>>(&text)
                .with_context(|| format!("parsing game catalog {}", path.display()))?
        }
        None => builtin(),
    };
    check(&games)?;
    select(games, only)
}

fn check(games: &[GameSpec]) -> Result<()> {
    let mut ids = HashSet::with_capacity(games.len());
    for game in games {
        game.check()?;
        if !ids.insert(game.id.as_str()) {
            bail!("game `{}` is defined twice", game.id);
        }
    }
    Ok(())
}

fn select(games: Vec<GameSpec>, only: &[String]) -> Result<Vec<GameSpec>> {
    if only.is_empty() {
        return Ok(games);
    }
    if let Some(unknown) = only.iter().find(|id| !games.iter().any(|g| &g.id == *id)) {
        bail!("unknown game `{unknown}`");
    }
    Ok(games
        .into_iter()
        .filter(|g| only.contains(&g.id))
        .collect())
}

/// Finds one game by id.
pub fn find<'a>(games: &'a [GameSpec], id: &str) -> Result<&'a GameSpec> {
    games
        .iter()
        .find(|g| g.id == id)
        .with_context(|| format!("unknown game `{id}`"))
}
