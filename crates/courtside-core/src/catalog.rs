//! Achievement catalog
//!
//! Static registry of every achievement a user can unlock. The catalog is
//! seeded once and never mutated by evaluation.

use crate::error::{Error, Result};
use crate::AchievementId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Stable ids of the standard achievements
pub mod ids {
    use crate::AchievementId;

    pub const FIRST_REVIEW: AchievementId = AchievementId::new(1);
    pub const TEN_REVIEWS: AchievementId = AchievementId::new(2);
    pub const FIRST_COMMENT: AchievementId = AchievementId::new(3);
    pub const SOCIAL: AchievementId = AchievementId::new(4);
    pub const FAVORITE_TEAM_REVIEW: AchievementId = AchievementId::new(5);
    pub const OVERTIME_GAME: AchievementId = AchievementId::new(6);
    pub const MAX_RATING: AchievementId = AchievementId::new(7);
    pub const TEN_LIKES: AchievementId = AchievementId::new(8);
    pub const TEN_FOLLOWERS: AchievementId = AchievementId::new(9);
    pub const DETAILED_REVIEWS: AchievementId = AchievementId::new(10);
    pub const RIVALRY_GAME: AchievementId = AchievementId::new(11);
    pub const WEEKLY_MARATHON: AchievementId = AchievementId::new(12);
    pub const FIFTY_REVIEWS: AchievementId = AchievementId::new(13);
    pub const FIFTY_LIKES: AchievementId = AchievementId::new(14);
    pub const TWENTY_FIVE_FOLLOWERS: AchievementId = AchievementId::new(15);
    pub const HUNDRED_REVIEWS: AchievementId = AchievementId::new(16);
    pub const FAVORITE_TEAM_EXPERT: AchievementId = AchievementId::new(17);
    pub const LEAGUE_COVERAGE: AchievementId = AchievementId::new(18);
}

/// Definition of an unlockable achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Stable identifier
    pub id: AchievementId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Experience awarded when unlocked
    pub xp_reward: u32,
}

impl AchievementDef {
    /// Create a new achievement definition
    pub fn new(
        id: AchievementId,
        name: impl Into<String>,
        description: impl Into<String>,
        xp_reward: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            xp_reward,
        }
    }
}

/// Registry of achievement definitions by id, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    defs: IndexMap<AchievementId, AchievementDef>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard catalog of eighteen achievements
    pub fn standard() -> Self {
        let defs = [
            (ids::FIRST_REVIEW, "Primeira Avaliação", "Você fez sua primeira avaliação de um jogo!", 10),
            (ids::TEN_REVIEWS, "Crítico Ativo", "Você já avaliou 10 jogos.", 50),
            (ids::FIRST_COMMENT, "Comentarista", "Deixou seu primeiro comentário em uma avaliação.", 5),
            (ids::SOCIAL, "Social", "Começou a seguir 5 usuários.", 25),
            (ids::FAVORITE_TEAM_REVIEW, "Coração Valente", "Avaliou uma partida do seu time do coração.", 25),
            (ids::OVERTIME_GAME, "Na Prorrogação", "Avaliou um jogo que foi decidido na prorrogação.", 75),
            (ids::MAX_RATING, "Jogo da Temporada", "Deu a nota máxima (5.0) para um jogo.", 20),
            (ids::TEN_LIKES, "Voz da Torcida", "Recebeu 10 curtidas em uma de suas avaliações.", 100),
            (ids::TEN_FOLLOWERS, "Formador de Opinião", "Foi seguido por 10 usuários.", 150),
            (ids::DETAILED_REVIEWS, "Analista Tático", "Avaliou 25 jogos, detalhando notas de ataque e defesa.", 150),
            (ids::RIVALRY_GAME, "Rivalidade Histórica", "Avaliou um clássico da NBA.", 40),
            (ids::WEEKLY_MARATHON, "Maratonista", "Avaliou 5 jogos em uma única semana.", 60),
            (ids::FIFTY_REVIEWS, "Crítico Experiente", "Alcançou a marca de 50 avaliações de jogos.", 200),
            (ids::FIFTY_LIKES, "Ouro Puro", "Sua avaliação recebeu 50 curtidas.", 200),
            (ids::TWENTY_FIVE_FOLLOWERS, "Influenciador", "Conquistou uma base de 25 seguidores.", 250),
            (ids::HUNDRED_REVIEWS, "Lenda da Análise", "Tornou-se uma referência com 100 avaliações.", 400),
            (ids::FAVORITE_TEAM_EXPERT, "Especialista da Franquia", "Avaliou 25 jogos do seu time do coração.", 250),
            (ids::LEAGUE_COVERAGE, "Maratonista da NBA", "Avaliou um jogo de cada uma das 30 equipes da liga.", 500),
        ];

        let mut catalog = Self::new();
        for (id, name, description, xp) in defs {
            catalog
                .defs
                .insert(id, AchievementDef::new(id, name, description, xp));
        }
        catalog
    }

    /// Build a catalog from definitions, rejecting duplicate ids
    pub fn from_defs(defs: impl IntoIterator<Item = AchievementDef>) -> Result<Self> {
        let mut catalog = Self::new();
        for def in defs {
            catalog.insert(def)?;
        }
        Ok(catalog)
    }

    /// Add a definition, rejecting duplicate ids
    pub fn insert(&mut self, def: AchievementDef) -> Result<()> {
        if self.defs.contains_key(&def.id) {
            return Err(Error::InvalidConfig(format!(
                "duplicate achievement {}",
                def.id
            )));
        }
        self.defs.insert(def.id, def);
        Ok(())
    }

    /// Look up a definition
    pub fn get(&self, id: AchievementId) -> Option<&AchievementDef> {
        self.defs.get(&id)
    }

    /// Look up a definition, treating absence as a catalog defect
    pub fn require(&self, id: AchievementId) -> Result<&AchievementDef> {
        self.get(id).ok_or(Error::UnknownAchievement(id))
    }

    pub fn contains(&self, id: AchievementId) -> bool {
        self.defs.contains_key(&id)
    }

    /// Iterate definitions in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &AchievementDef> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Sum of every reward in the catalog
    pub fn total_xp(&self) -> u64 {
        self.iter().map(|d| d.xp_reward as u64).sum()
    }
}
