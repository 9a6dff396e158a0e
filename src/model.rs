use crate::scheduler::SchedError;
use crate::timezone;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Schedule
    ScheduleId
);
string_id!(
    /// Identifiant fort pour Layer
    LayerId
);
string_id!(
    /// Identifiant fort pour Override
    OverrideId
);
string_id!(
    /// Identifiant opaque d'un utilisateur (résolu hors du moteur)
    UserId
);

/// Données d'affichage attachées à un utilisateur, fournies par l'appelant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            avatar_url: None,
        }
    }
}

/// Intervalle UTC semi-ouvert `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Crée un intervalle en validant que `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SchedError> {
        if end <= start {
            return Err(SchedError::InvalidTimeRange);
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Intersection non vide, sinon `None`.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Interval { start, end })
    }
}

/// Membre d'une layer, à une position 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerUser {
    pub user_id: UserId,
    #[serde(default)]
    pub user: UserProfile,
    pub position: u32,
}

/// Sens de déplacement d'un membre dans l'ordre de rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Rotation récurrente d'utilisateurs (une piste de couverture parallèle).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    pub rotation_length_hours: u32,
    #[serde(default)]
    pub users: Vec<LayerUser>,
}

impl Layer {
    /// Crée une layer vide en validant la durée de rotation et `end > start`.
    pub fn new(
        name: String,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        rotation_length_hours: u32,
    ) -> Result<Self, SchedError> {
        let layer = Self {
            id: LayerId::random(),
            name,
            start,
            end,
            rotation_length_hours,
            users: Vec::new(),
        };
        layer.validate()?;
        Ok(layer)
    }

    pub fn validate(&self) -> Result<(), SchedError> {
        if self.rotation_length_hours == 0 {
            return Err(SchedError::InvalidRotationLength(self.id.clone()));
        }
        if let Some(end) = self.end {
            if end <= self.start {
                return Err(SchedError::InvalidTimeRange);
            }
        }
        Ok(())
    }

    pub fn rotation_length(&self) -> Duration {
        Duration::hours(i64::from(self.rotation_length_hours))
    }

    /// Membres triés par position croissante.
    pub fn ordered_users(&self) -> Vec<&LayerUser> {
        let mut users: Vec<&LayerUser> = self.users.iter().collect();
        users.sort_by_key(|u| u.position);
        users
    }

    /// Ajoute un membre en fin de rotation. Un membre déjà présent est déplacé à la fin.
    pub fn add_user(&mut self, user_id: UserId, user: UserProfile) {
        self.users.sort_by_key(|u| u.position);
        self.users.retain(|u| u.user_id != user_id);
        self.users.push(LayerUser {
            user_id,
            user,
            position: 0,
        });
        self.renumber();
    }

    pub fn remove_user(&mut self, user_id: &UserId) -> Result<(), SchedError> {
        let before = self.users.len();
        self.users.retain(|u| &u.user_id != user_id);
        if self.users.len() == before {
            return Err(SchedError::UnknownUser(user_id.as_str().to_string()));
        }
        self.users.sort_by_key(|u| u.position);
        self.renumber();
        Ok(())
    }

    /// Échange un membre avec son voisin. Sans effet aux extrémités ou si inconnu.
    pub fn move_user(&mut self, user_id: &UserId, direction: MoveDirection) {
        self.users.sort_by_key(|u| u.position);
        let Some(index) = self.users.iter().position(|u| &u.user_id == user_id) else {
            return;
        };
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|t| *t < self.users.len()),
        };
        if let Some(target) = target {
            self.users.swap(index, target);
            self.renumber();
        }
    }

    // positions denses 1..N dans l'ordre courant du vecteur
    fn renumber(&mut self) {
        for (idx, entry) in self.users.iter_mut().enumerate() {
            entry.position = idx as u32 + 1;
        }
    }
}

/// Remplacement manuel sur un intervalle, au niveau du schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Override {
    pub id: OverrideId,
    pub user_id: UserId,
    #[serde(default)]
    pub user: UserProfile,
    /// Informatif (ciblage des notifications), n'intervient pas dans le découpage.
    #[serde(default)]
    pub replaces_user_id: Option<UserId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Override {
    /// Crée un override en validant que `end > start`.
    pub fn new(
        user_id: UserId,
        user: UserProfile,
        replaces_user_id: Option<UserId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, SchedError> {
        let over = Self {
            id: OverrideId::random(),
            user_id,
            user,
            replaces_user_id,
            start,
            end,
        };
        over.validate()?;
        Ok(over)
    }

    pub fn validate(&self) -> Result<(), SchedError> {
        if self.end <= self.start {
            return Err(SchedError::InvalidOverride(self.id.clone()));
        }
        Ok(())
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end,
        }
    }
}

/// Schedule complet : fuseau, layers ordonnées et overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub time_zone: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub overrides: Vec<Override>,
}

impl Schedule {
    /// Crée un schedule vide ; le fuseau doit être un nom IANA connu.
    pub fn new<N: Into<String>, Z: Into<String>>(name: N, time_zone: Z) -> Result<Self, SchedError> {
        let time_zone = time_zone.into();
        timezone::parse_zone(&time_zone)?;
        Ok(Self {
            id: ScheduleId::random(),
            name: name.into(),
            time_zone,
            layers: Vec::new(),
            overrides: Vec::new(),
        })
    }

    pub fn zone(&self) -> Result<chrono_tz::Tz, SchedError> {
        timezone::parse_zone(&self.time_zone)
    }

    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id.clone();
        self.layers.push(layer);
        id
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> Result<Layer, SchedError> {
        let pos = self
            .layers
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| SchedError::UnknownLayer(id.as_str().to_string()))?;
        Ok(self.layers.remove(pos))
    }

    pub fn layer_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| &l.id == id)
    }

    pub fn find_layer_by_name<'a>(&'a self, name: &str) -> Option<&'a Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn add_override(&mut self, over: Override) -> OverrideId {
        let id = over.id.clone();
        self.overrides.push(over);
        id
    }

    pub fn remove_override(&mut self, id: &OverrideId) -> Result<Override, SchedError> {
        let pos = self
            .overrides
            .iter()
            .position(|o| &o.id == id)
            .ok_or_else(|| SchedError::UnknownOverride(id.as_str().to_string()))?;
        Ok(self.overrides.remove(pos))
    }

    /// Overrides dont l'intervalle intersecte la fenêtre.
    pub fn overrides_within(&self, window: &Interval) -> Vec<&Override> {
        self.overrides
            .iter()
            .filter(|o| o.interval().overlaps(window))
            .collect()
    }
}

/// Origine d'un bloc calculé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSource {
    Rotation,
    Override,
}

impl BlockSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockSource::Rotation => "rotation",
            BlockSource::Override => "override",
        }
    }
}

/// Bloc de couverture calculé (jamais persisté).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub layer_id: LayerId,
    pub layer_name: String,
    pub user_id: UserId,
    pub user: UserProfile,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub source: BlockSource,
}

impl ScheduleBlock {
    /// Clé synthétique stable : id de layer + début du bloc (secondes Unix).
    pub fn key(&self) -> String {
        let mut buf = itoa::Buffer::new();
        let secs = buf.format(self.start.timestamp());
        let mut key = String::with_capacity(self.layer_id.as_str().len() + 1 + secs.len());
        key.push_str(self.layer_id.as_str());
        key.push('-');
        key.push_str(secs);
        key
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_active_at(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}
