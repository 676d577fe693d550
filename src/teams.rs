use std::sync::LazyLock;

use regex::Regex;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// The ten KBO league clubs. `Display` yields the canonical short name used
/// throughout the pipeline and in the persisted caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Team {
    #[strum(serialize = "SSG")]
    Ssg,
    #[strum(serialize = "KIA")]
    Kia,
    #[strum(serialize = "KT")]
    Kt,
    #[strum(serialize = "LG")]
    Lg,
    #[strum(serialize = "두산")]
    Doosan,
    #[strum(serialize = "롯데")]
    Lotte,
    #[strum(serialize = "삼성")]
    Samsung,
    #[strum(serialize = "NC")]
    Nc,
    #[strum(serialize = "키움")]
    Kiwoom,
    #[strum(serialize = "한화")]
    Hanwha,
}

impl Team {
    /// Known spellings for this club: the canonical name itself, full club
    /// names, Korean transliterations, and mascot-only forms.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Team::Ssg => &["SSG", "SSG랜더스", "SSG Landers", "랜더스"],
            Team::Kia => &["KIA", "KIA타이거즈", "기아", "KIA Tigers", "타이거즈"],
            Team::Kt => &["KT", "KT위즈", "kt", "케이티", "KT Wiz", "kt wiz", "위즈"],
            Team::Lg => &["LG", "LG트윈스", "엘지", "트윈스"],
            Team::Doosan => &["두산", "두산베어스", "베어스"],
            Team::Lotte => &["롯데", "롯데자이언츠", "자이언츠"],
            Team::Samsung => &["삼성", "삼성라이온즈", "라이온즈"],
            Team::Nc => &["NC", "NC다이노스", "엔씨", "다이노스"],
            Team::Kiwoom => &["키움", "키움히어로즈", "히어로즈"],
            Team::Hanwha => &["한화", "한화이글스", "이글스"],
        }
    }
}

/// Compound bilingual spellings like "kt wiz 위즈" or "Kia 타이거즈 Tigers" that
/// the alias table cannot cover exhaustively.
static BILINGUAL_PATTERNS: LazyLock<Vec<(Regex, Team)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\bk\s*t\b.*\bwiz\b").expect("valid kt pattern"),
            Team::Kt,
        ),
        (
            Regex::new(r"(?i)\bkia\b.*\btigers\b").expect("valid kia pattern"),
            Team::Kia,
        ),
    ]
});

/// Resolve free-text input to a [`Team`], or `None` if nothing matches.
///
/// Matching order: exact alias lookup (case-insensitive, trimmed), the same
/// lookup with internal whitespace removed, bilingual compound patterns, then
/// two loose high-collision substring checks.
pub fn resolve_team(raw: &str) -> Option<Team> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let key = trimmed.to_lowercase();
    let squashed: String = key.split_whitespace().collect();

    for team in Team::iter() {
        for alias in team.aliases() {
            if alias.to_lowercase() == key {
                return Some(team);
            }
        }
    }
    for team in Team::iter() {
        for alias in team.aliases() {
            let alias_squashed: String = alias.to_lowercase().split_whitespace().collect();
            if alias_squashed == squashed {
                return Some(team);
            }
        }
    }
    for (pattern, team) in BILINGUAL_PATTERNS.iter() {
        if pattern.is_match(trimmed) {
            return Some(*team);
        }
    }
    if trimmed.contains("위즈") {
        return Some(Team::Kt);
    }
    if trimmed.contains("타이거") || trimmed.contains("기아") {
        return Some(Team::Kia);
    }
    None
}

/// Canonicalize a free-text team name.
///
/// Total: unresolvable input comes back trimmed but otherwise unchanged, so the
/// function is safe to apply to anything. Idempotent: every canonical name is
/// its own alias, so `resolve(resolve(x)) == resolve(x)`.
pub fn resolve(raw: &str) -> String {
    match resolve_team(raw) {
        Some(team) => team.to_string(),
        None => raw.trim().to_string(),
    }
}
