pub use crate::models::{Catalog, Party, Recipe};
use crate::gate::{long_date, redact, Clock, Gate, Override};
use crate::models::LoadError;
use crate::nav::Nav;
use crate::tent::TentCard;
use chrono::NaiveDate;
use clap::Parser;
use gotham::helpers::http::response::create_response;
use gotham::middleware::state::StateMiddleware;
use gotham::pipeline::{single_middleware, single_pipeline};
use gotham::router::{builder::*, Router};
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};
use hyper::header::{HeaderValue, CACHE_CONTROL};
use hyper::{Body, Response, StatusCode};
use log::{debug, error, info, warn};
use serde_derive::Deserialize;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

mod gate;
mod models;
mod nav;
mod tent;

include!(concat!(env!("OUT_DIR"), "/templates.rs"));

/// Serves the dinner party pages.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Settings file, without extension.
    #[arg(long, default_value = "settings")]
    settings: String,
    /// Party data file; overrides `data_path` from the settings.
    #[arg(long)]
    data: Option<PathBuf>,
}

#[derive(Deserialize, Debug)]
struct Config {
    host: String,
    port: u16,
    data_path: PathBuf,
    site_title: String,
    /// Pins "today", for previewing a party as it will look on a given day.
    pinned_date: Option<NaiveDate>,
}

impl Config {
    fn load(args: &Args) -> Result<Config, Error> {
        let mut settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 7878_i64)?
            .set_default("data_path", "data/parties.json")?
            .set_default("site_title", "Dinner Parties")?
            .add_source(config::File::with_name(&args.settings).required(false))
            .add_source(config::Environment::with_prefix("PARTY"));
        if let Some(data) = &args.data {
            settings = settings.set_override("data_path", format!("{}", data.display()))?;
        }
        Ok(settings.build()?.try_deserialize::<Config>()?)
    }

    fn clock(&self) -> Clock {
        match self.pinned_date {
            Some(date) => Clock::Fixed(date),
            None => Clock::System,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let args = Args::parse();
    let config = Config::load(&args)?;
    let catalog = Catalog::load(&config.data_path)?;
    let clock = config.clock();
    info!(
        "Loaded {} parties from {}, clock {:?}",
        catalog.parties.len(),
        config.data_path.display(),
        clock
    );

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening for requests at http://{}", addr);
    gotham::start(addr, router(Site::new(catalog, clock, config.site_title)))
        .map_err(|err| Error::Serve(format!("{:?}", err)))
}

/// Read-only state shared by every request.
#[derive(Clone, StateData)]
struct Site {
    catalog: Arc<Catalog>,
    clock: Clock,
    title: Arc<str>,
}

impl Site {
    fn new(catalog: Catalog, clock: Clock, title: String) -> Site {
        Site {
            catalog: Arc::new(catalog),
            clock,
            title: title.into(),
        }
    }
}

fn router(site: Site) -> Router {
    let (chain, pipelines) = single_pipeline(single_middleware(StateMiddleware::new(site)));
    build_router(chain, pipelines, |route| {
        route.get("/").to(serve_home);
        route
            .get("/static/:name")
            .with_path_extractor::<StaticPath>()
            .to(serve_static);
        route.get("/party").to(serve_parties);
        route.get("/party/toilet").to(serve_toilet);

        route
            .get("/party/:id")
            .with_path_extractor::<PartyPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(serve_party);
        route
            .get("/party/:id/schedule")
            .with_path_extractor::<PartyPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(serve_schedule);
        route
            .get("/party/:id/menu")
            .with_path_extractor::<PartyPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(serve_menu);
        route
            .get("/party/:id/menu/cooking")
            .with_path_extractor::<PartyPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(serve_cooking);
        route
            .get("/party/:id/drinks")
            .with_path_extractor::<PartyPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(serve_drinks);
        route
            .get("/party/:id/games")
            .with_path_extractor::<PartyPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(serve_games);
        route
            .get("/party/:id/games/identity-cards")
            .with_path_extractor::<PartyPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(serve_identity_cards);
    })
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
struct PartyPath {
    id: String,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
struct PageQuery {
    #[serde(rename = "override")]
    override_flag: Option<String>,
    angle: Option<String>,
    recipe: Option<String>,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
struct StaticPath {
    name: String,
}

pub struct OpenGraph {
    pub description: String,
    pub summary: String,
}

pub struct ScheduleRow<'a> {
    pub time: &'a str,
    pub activity: Cow<'a, str>,
    pub hidden: bool,
}

/// One recipe of the cooking carousel plus links to its neighbours.
pub struct Slide<'a> {
    pub recipe: &'a Recipe,
    pub index: usize,
    pub count: usize,
    pub previous_href: String,
    pub next_href: String,
    pub dots: Vec<Dot>,
}

impl<'a> Slide<'a> {
    fn new(recipes: &'a [Recipe], requested: Option<&str>, nav: &Nav) -> Option<Slide<'a>> {
        let count = recipes.len();
        if count == 0 {
            return None;
        }
        let index = requested
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(0)
            % count;
        let path = nav.path("menu/cooking");
        let href = |i: usize| nav.with(&path, &[("recipe", i.to_string().as_str())]);
        Some(Slide {
            recipe: &recipes[index],
            index,
            count,
            previous_href: href((index + count - 1) % count),
            next_href: href((index + 1) % count),
            dots: (0..count)
                .map(|i| Dot {
                    href: href(i),
                    number: i + 1,
                    current: i == index,
                })
                .collect(),
        })
    }

    pub fn position(&self) -> usize {
        self.index + 1
    }
}

pub struct Dot {
    pub href: String,
    pub number: usize,
    pub current: bool,
}

/// Everything a party page needs from one request.
struct Visit<'a> {
    party: &'a Party,
    catalog: &'a Catalog,
    gate: Gate,
    nav: Nav<'a>,
    query: &'a PageQuery,
}

impl<'a> Visit<'a> {
    fn from_state(state: &'a State) -> Result<Visit<'a>, Error> {
        let site = Site::borrow_from(state);
        let PartyPath { id } = PartyPath::borrow_from(state);
        let query = PageQuery::borrow_from(state);
        let party = site.catalog.party(id).ok_or_else(|| {
            warn!("Request for unknown party {:?}", id);
            Error::PartyNotFound(id.clone())
        })?;
        let gate = Gate::new(
            site.clock.today(),
            Override::from_query(query.override_flag.as_deref()),
        );
        Ok(Visit {
            party,
            catalog: &site.catalog,
            gate,
            nav: Nav::new(&party.id, gate.is_overridden()),
            query,
        })
    }

    fn released(&self) -> bool {
        let open = self.gate.opens(self.party.release_date);
        debug!(
            "Gate for {} on {}: open={} override={}",
            self.party.id,
            self.gate.today(),
            open,
            self.gate.is_overridden()
        );
        open
    }

    /// Renders the "Not Available Yet" page for a section, linking back to
    /// the party.
    fn locked(
        &self,
        subtitle: &str,
        what: &str,
        unlock: Option<NaiveDate>,
    ) -> Result<Vec<u8>, Error> {
        self.locked_with_back(subtitle, what, unlock, &self.nav.party(), "Back to Party")
    }

    fn locked_with_back(
        &self,
        subtitle: &str,
        what: &str,
        unlock: Option<NaiveDate>,
        back_href: &str,
        back_label: &str,
    ) -> Result<Vec<u8>, Error> {
        let message = match unlock {
            Some(date) => format!("{} on {}", what, long_date(date)),
            None => format!("{} at a later date", what),
        };
        let mut buf = Vec::new();
        templates::locked_html(
            &mut buf,
            self.party,
            &self.nav,
            subtitle,
            &message,
            back_href,
            back_label,
        )?;
        Ok(buf)
    }
}

fn respond(state: State, render: fn(&State) -> Result<Vec<u8>, Error>) -> (State, Response<Body>) {
    let response = match render(&state) {
        Ok(body) => create_response(&state, StatusCode::OK, mime::TEXT_HTML_UTF_8, body),
        Err(err) => err.as_response(&state),
    };
    (state, response)
}

fn serve_home(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let site = Site::borrow_from(state);
        let mut buf = Vec::new();
        templates::home_html(&mut buf, &site.title)?;
        Ok(buf)
    })
}

fn serve_parties(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let site = Site::borrow_from(state);
        let mut buf = Vec::new();
        templates::parties_html(&mut buf, &site.title, &site.catalog.parties)?;
        Ok(buf)
    })
}

fn serve_toilet(state: State) -> (State, Response<Body>) {
    respond(state, |_| {
        let mut buf = Vec::new();
        templates::toilet_html(&mut buf)?;
        Ok(buf)
    })
}

fn serve_party(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let visit = Visit::from_state(state)?;
        let party = visit.party;
        let og = OpenGraph {
            description: party.welcome_message.clone(),
            summary: format!(
                "Join us for {} on {}. {} dress code.",
                party.title,
                long_date(party.release_date),
                party.dress_code
            ),
        };
        let mut buf = Vec::new();
        templates::party_html(&mut buf, party, &visit.nav, visit.released(), Some(&og))?;
        Ok(buf)
    })
}

fn serve_schedule(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let visit = Visit::from_state(state)?;
        let released = visit.released();
        let rows: Vec<ScheduleRow> = visit
            .party
            .schedule
            .iter()
            .map(|item| {
                let hidden = item.hide_until_release && !released;
                ScheduleRow {
                    time: &item.time,
                    activity: if hidden {
                        Cow::Owned(redact(&item.activity))
                    } else {
                        Cow::Borrowed(&item.activity)
                    },
                    hidden,
                }
            })
            .collect();
        let mut buf = Vec::new();
        templates::schedule_html(&mut buf, visit.party, &visit.nav, &rows)?;
        Ok(buf)
    })
}

fn serve_menu(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let visit = Visit::from_state(state)?;
        if !visit.released() {
            return visit.locked(
                "Menu",
                "The menu will be available",
                Some(visit.party.release_date),
            );
        }
        let card = TentCard::from_query(visit.query.angle.as_deref());
        let mut buf = Vec::new();
        templates::menu_html(
            &mut buf,
            visit.party,
            &visit.nav,
            &card,
            &visit.nav.path("menu"),
        )?;
        Ok(buf)
    })
}

fn serve_cooking(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let visit = Visit::from_state(state)?;
        if !visit.released() {
            return visit.locked(
                "Cooking Mode",
                "The recipes will be available",
                Some(visit.party.release_date),
            );
        }
        let mut buf = Vec::new();
        match Slide::new(
            visit.party.menu.recipes(),
            visit.query.recipe.as_deref(),
            &visit.nav,
        ) {
            Some(slide) => templates::cooking_html(&mut buf, visit.party, &visit.nav, &slide)?,
            None => templates::no_recipes_html(&mut buf, visit.party, &visit.nav)?,
        }
        Ok(buf)
    })
}

fn serve_drinks(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let visit = Visit::from_state(state)?;
        if !visit.released() {
            return visit.locked(
                "Drinks Menu",
                "The drinks menu will be available",
                Some(visit.party.release_date),
            );
        }
        let mut buf = Vec::new();
        templates::drinks_html(&mut buf, visit.party, &visit.nav)?;
        Ok(buf)
    })
}

fn serve_games(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let visit = Visit::from_state(state)?;
        if !visit.released() {
            return visit.locked(
                "Party Games",
                "The games will be revealed",
                Some(visit.party.release_date),
            );
        }
        let identity_cards_open = visit.gate.identity_cards_open(visit.party.release_date);
        let mut buf = Vec::new();
        templates::games_html(&mut buf, visit.party, &visit.nav, identity_cards_open)?;
        Ok(buf)
    })
}

fn serve_identity_cards(state: State) -> (State, Response<Body>) {
    respond(state, |state| {
        let visit = Visit::from_state(state)?;
        let release = visit.party.release_date;
        if !visit.gate.identity_cards_open(release) {
            return visit.locked_with_back(
                "Identity Cards",
                "The identity cards will be available",
                gate::identity_cards_release(release),
                &visit.nav.section("games"),
                "Back to Games",
            );
        }
        let mut buf = Vec::new();
        templates::identity_cards_html(
            &mut buf,
            visit.party,
            &visit.nav,
            &visit.catalog.envelopes,
        )?;
        Ok(buf)
    })
}

fn serve_static(state: State) -> (State, Response<Body>) {
    let name = StaticPath::borrow_from(&state).name.clone();
    let response = match templates::statics::StaticFile::get(&name) {
        Some(file) => {
            let mut response =
                create_response(&state, StatusCode::OK, file.mime.clone(), file.content);
            response.headers_mut().insert(
                CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            );
            response
        }
        None => Error::StaticNotFound(name).as_response(&state),
    };
    (state, response)
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("No party with id {0}")]
    PartyNotFound(String),
    #[error("No static file named {0}")]
    StaticNotFound(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Data(#[from] LoadError),
    #[error("Could not render page: {0}")]
    Render(#[from] std::io::Error),
    #[error("Server stopped: {0}")]
    Serve(String),
}

impl Error {
    fn as_response(&self, state: &State) -> Response<Body> {
        create_response(
            state,
            self.status_code(),
            mime::TEXT_PLAIN_UTF_8,
            format!("Error: {}", self),
        )
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::PartyNotFound(..) | Error::StaticNotFound(..) => StatusCode::NOT_FOUND,
            Error::Config(..) | Error::Data(..) | Error::Render(..) | Error::Serve(..) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
