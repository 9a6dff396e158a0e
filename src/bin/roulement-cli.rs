#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use roulement::{
    coverage::{CoverageQuery, OnCallTarget},
    io,
    model::{Layer, LayerId, MoveDirection, Override, OverrideId, Schedule, UserId, UserProfile},
    scheduler::ScheduleComposer,
    storage::{JsonStorage, Storage},
    timezone,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Horizon de recherche pour `who --next`.
const LOOKAHEAD_DAYS: i64 = 90;

/// CLI de composition d'astreintes (layers, overrides, couverture)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du schedule
    #[arg(long, global = true, default_value = "schedule.json")]
    schedule: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer un schedule vide
    Init {
        #[arg(long)]
        name: String,
        /// Fuseau IANA (ex. Europe/Paris)
        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Ajouter une layer de rotation
    AddLayer {
        #[arg(long)]
        name: String,
        /// RFC3339 ou heure locale `YYYY-MM-DDTHH:MM`
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        rotation_hours: u32,
    },

    /// Supprimer une layer (nom ou id)
    RemoveLayer {
        #[arg(long)]
        layer: String,
    },

    /// Ajouter un membre en fin de rotation
    AddUser {
        /// Nom ou id de la layer
        #[arg(long)]
        layer: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        name: String,
    },

    /// Déplacer un membre dans l'ordre de rotation
    MoveUser {
        #[arg(long)]
        layer: String,
        #[arg(long)]
        user_id: String,
        #[arg(long, value_enum)]
        direction: Direction,
    },

    /// Retirer un membre
    RemoveUser {
        #[arg(long)]
        layer: String,
        #[arg(long)]
        user_id: String,
    },

    /// Déclarer un override
    AddOverride {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Utilisateur remplacé (informatif)
        #[arg(long)]
        replaces: Option<String>,
    },

    /// Supprimer un override
    RemoveOverride {
        #[arg(long)]
        id: String,
    },

    /// Importer des overrides depuis un CSV
    ImportOverrides {
        #[arg(long)]
        csv: String,
    },

    /// Calculer les blocs d'une fenêtre, et optionnellement exporter
    Compose {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Qui est d'astreinte (maintenant par défaut)
    Who {
        #[arg(long)]
        at: Option<String>,
        /// Prochaine relève plutôt que l'instant courant
        #[arg(long)]
        next: bool,
    },

    /// Lister les trous de couverture
    Gaps {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Statistiques de couverture et heures par personne
    Coverage {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.schedule)?;

    if let Commands::Init { name, tz } = &cli.cmd {
        if storage.exists() {
            bail!("{} already exists", storage.path().display());
        }
        let schedule = Schedule::new(name.as_str(), tz.as_str())?;
        storage.save(&schedule)?;
        println!("{}", schedule.id);
        std::process::exit(0);
    }

    let mut schedule = storage
        .load()
        .with_context(|| "no schedule loaded (run `init` first?)")?;
    let tz = schedule.zone()?;
    let composer = ScheduleComposer::new();

    let code = match cli.cmd {
        Commands::Init { .. } => 0,
        Commands::AddLayer {
            name,
            start,
            end,
            rotation_hours,
        } => {
            let start = timezone::parse_instant(&start, tz)?;
            let end = end
                .map(|e| timezone::parse_instant(&e, tz))
                .transpose()?;
            let layer = Layer::new(name, start, end, rotation_hours)?;
            let id = schedule.add_layer(layer);
            storage.save(&schedule)?;
            println!("{id}");
            0
        }
        Commands::RemoveLayer { layer } => {
            let id = layer_id(&schedule, &layer)?;
            schedule.remove_layer(&id)?;
            storage.save(&schedule)?;
            0
        }
        Commands::AddUser {
            layer,
            user_id,
            name,
        } => {
            let id = layer_id(&schedule, &layer)?;
            if let Some(l) = schedule.layer_mut(&id) {
                l.add_user(UserId::new(user_id), UserProfile::new(name));
            }
            storage.save(&schedule)?;
            0
        }
        Commands::MoveUser {
            layer,
            user_id,
            direction,
        } => {
            let id = layer_id(&schedule, &layer)?;
            if let Some(l) = schedule.layer_mut(&id) {
                l.move_user(&UserId::new(user_id), direction.into());
            }
            storage.save(&schedule)?;
            0
        }
        Commands::RemoveUser { layer, user_id } => {
            let id = layer_id(&schedule, &layer)?;
            if let Some(l) = schedule.layer_mut(&id) {
                l.remove_user(&UserId::new(user_id))?;
            }
            storage.save(&schedule)?;
            0
        }
        Commands::AddOverride {
            user_id,
            name,
            start,
            end,
            replaces,
        } => {
            let over = Override::new(
                UserId::new(user_id),
                UserProfile::new(name),
                replaces.map(UserId::new),
                timezone::parse_instant(&start, tz)?,
                timezone::parse_instant(&end, tz)?,
            )?;
            let id = schedule.add_override(over);
            storage.save(&schedule)?;
            println!("{id}");
            0
        }
        Commands::RemoveOverride { id } => {
            schedule.remove_override(&OverrideId::new(id))?;
            storage.save(&schedule)?;
            0
        }
        Commands::ImportOverrides { csv } => {
            let overrides = io::import_overrides_csv(csv, tz)?;
            println!("imported {} override(s)", overrides.len());
            schedule.overrides.extend(overrides);
            storage.save(&schedule)?;
            0
        }
        Commands::Compose {
            from,
            to,
            out_json,
            out_csv,
        } => {
            let (from, to) = window(&from, &to, tz)?;
            let blocks = composer.compose(&schedule, from, to)?;
            if let Some(path) = out_json {
                io::export_blocks_json(path, &blocks)?;
            }
            if let Some(path) = out_csv {
                io::export_blocks_csv(path, &blocks)?;
            }
            for b in &blocks {
                println!("{}", timezone::render_block(b, tz));
            }
            0
        }
        Commands::Who { at, next } => {
            let at = match at {
                Some(raw) => timezone::parse_instant(&raw, tz)?,
                None => Utc::now(),
            };
            let blocks = composer.compose(&schedule, at, at + Duration::days(LOOKAHEAD_DAYS))?;
            let query = CoverageQuery::new(&blocks);
            let target = if next {
                OnCallTarget::Next
            } else {
                OnCallTarget::Current
            };
            let users = query.on_call(at, target);
            if users.is_empty() {
                println!("nobody on call");
                2
            } else {
                for user in users {
                    let name = blocks
                        .iter()
                        .find(|b| b.user_id == user)
                        .map(|b| b.user.name.as_str())
                        .unwrap_or("-");
                    println!("{user} | {name}");
                }
                0
            }
        }
        Commands::Gaps { from, to } => {
            let (from, to) = window(&from, &to, tz)?;
            let blocks = composer.compose(&schedule, from, to)?;
            let gaps = CoverageQuery::new(&blocks).gaps(from, to)?;
            if gaps.is_empty() {
                println!("OK: full coverage");
                0
            } else {
                eprintln!("Found {} gap(s)", gaps.len());
                for g in &gaps {
                    println!(
                        "{} → {}",
                        timezone::format_local(g.start, tz),
                        timezone::format_local(g.end, tz)
                    );
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Coverage { from, to } => {
            let (from, to) = window(&from, &to, tz)?;
            let blocks = composer.compose(&schedule, from, to)?;
            let query = CoverageQuery::new(&blocks);
            let summary = query.summary(from, to, tz)?;
            println!(
                "coverage: {:.1}% ({} / {} min), {} gap(s) over {} day(s)",
                summary.coverage_percent,
                summary.covered_minutes,
                summary.total_minutes,
                summary.gaps.len(),
                summary.gap_days
            );
            for (user, minutes) in query.scheduled_minutes_by_user(from, to) {
                println!("{user} | {:.1}h", minutes as f64 / 60.0);
            }
            0
        }
    };

    std::process::exit(code);
}

fn layer_id(schedule: &Schedule, key: &str) -> Result<LayerId> {
    schedule
        .find_layer_by_name(key)
        .or_else(|| schedule.layers.iter().find(|l| l.id.as_str() == key))
        .map(|l| l.id.clone())
        .ok_or_else(|| anyhow::anyhow!("unknown layer: {}", key))
}

fn window(from: &str, to: &str, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let from = timezone::parse_instant(from, tz)?;
    let to = timezone::parse_instant(to, tz)?;
    if to <= from {
        bail!("--to must be after --from");
    }
    Ok((from, to))
}
