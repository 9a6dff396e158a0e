#![forbid(unsafe_code)]
//! Roulement — moteur de composition d'astreintes (pur, synchrone, sans état).
//!
//! - Rotations récurrentes ancrées sur le début de chaque layer.
//! - Overrides découpant les blocs de rotation, le dernier appliqué l'emporte.
//! - Lecture de couverture : actifs à un instant, prochain changement, trous.
//! - Tout en UTC ; le fuseau du schedule ne sert qu'aux saisies et à l'affichage.

pub mod coverage;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;
pub mod timezone;

pub use coverage::{CoverageQuery, CoverageSummary, OnCallTarget};
pub use model::{
    BlockSource, Interval, Layer, LayerId, LayerUser, MoveDirection, Override, OverrideId,
    Schedule, ScheduleBlock, ScheduleId, UserId, UserProfile,
};
pub use scheduler::{ComposeOptions, OverrideScope, SchedError, ScheduleComposer};
pub use storage::{JsonStorage, Storage};
