//! Retrieval query selection.
//!
//! Maps a [`PatientProfile`] to the ordered list of `file_search` queries the
//! model is allowed to run against the vaccination calendar. Every rule is a
//! literal substring test over lower-cased free text so the selection stays
//! reproducible; the term lists below are the whole of the matching logic.

use crate::PatientProfile;

/// Fixed catalog of retrieval queries, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchQuery {
    PediatricCalendar,
    AdultCalendar,
    Pregnancy,
    LiveVaccineContraindications,
    Immunocompromised,
    Travel,
    Anticoagulants,
    Allergy,
    Occupational,
    Intervals,
}

impl SearchQuery {
    pub const ALL: [SearchQuery; 10] = [
        SearchQuery::PediatricCalendar,
        SearchQuery::AdultCalendar,
        SearchQuery::Pregnancy,
        SearchQuery::LiveVaccineContraindications,
        SearchQuery::Immunocompromised,
        SearchQuery::Travel,
        SearchQuery::Anticoagulants,
        SearchQuery::Allergy,
        SearchQuery::Occupational,
        SearchQuery::Intervals,
    ];

    /// Query text sent to the model
    pub fn text(self) -> &'static str {
        match self {
            SearchQuery::PediatricCalendar => {
                "Calendrier vaccinal nourrissons enfants adolescents obligations rattrapage doses"
            }
            SearchQuery::AdultCalendar => {
                "Calendrier vaccinal obligatoire recommandé adulte rattrapage doses rappels"
            }
            SearchQuery::Pregnancy => {
                "Vaccination femmes enceintes grossesse coqueluche grippe covid VRS Abrysvo"
            }
            SearchQuery::LiveVaccineContraindications => {
                "Vaccins vivants contre-indications ROR varicelle BCG fièvre jaune grossesse immunodépression"
            }
            SearchQuery::Immunocompromised => {
                "Vaccination des personnes immunodéprimées aspléniques traitement immunosuppresseur biothérapie"
            }
            SearchQuery::Travel => {
                "Vaccinations du voyageur fièvre jaune hépatite A typhoïde rage encéphalite"
            }
            SearchQuery::Anticoagulants => {
                "Précautions vaccination patients sous anticoagulants voie intramusculaire sous-cutanée"
            }
            SearchQuery::Allergy => {
                "Contre-indications allergie anaphylaxie composant du vaccin précautions"
            }
            SearchQuery::Occupational => {
                "Vaccinations des professionnels de santé petite enfance personnes âgées exposition professionnelle"
            }
            SearchQuery::Intervals => "Intervalles délais minimum entre doses rappels vaccins",
        }
    }
}

/// Ordered, duplicate-free list of selected queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryList(Vec<SearchQuery>);

impl QueryList {
    fn push(&mut self, query: SearchQuery) {
        if !self.0.contains(&query) {
            self.0.push(query);
        }
    }

    pub fn contains(&self, query: SearchQuery) -> bool {
        self.0.contains(&query)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SearchQuery> + '_ {
        self.0.iter().copied()
    }

    /// Query texts in selection order
    pub fn texts(&self) -> Vec<&'static str> {
        self.iter().map(SearchQuery::text).collect()
    }
}

const AFFIRMATIVE: &[&str] = &["oui", "yes", "true", "1", "o", "y", "x"];

const FEMALE: &[&str] = &["f", "femme", "female", "féminin", "feminin", "w", "woman"];

const PEDIATRIC_TERMS: &[&str] = &[
    "nourrisson",
    "nouveau-né",
    "bébé",
    "bebe",
    "enfant",
    "adolescent",
    "pédiatr",
    "pediatr",
    "mois",
];

/// Upper bound (exclusive) of the pediatric age bands, in years
const ADULT_AGE: u32 = 18;

/// Markers turning the following number into an exclusive upper bound
const BELOW_MARKERS: &[&str] = &["moins de", "<", "under"];

/// A pregnancy status whose first word is one of these is a negative answer
const NEGATIONS: &[&str] = &["non", "no", "not", "none", "pas", "aucun", "aucune", "jamais"];

const PREGNANCY_TERMS: &[&str] = &[
    "enceinte",
    "grossesse",
    "projet",
    "post-partum",
    "postpartum",
    "accouch",
    "pregnan",
    "oui",
    "yes",
];

const IMMUNOSUPPRESSIVE_TREATMENTS: &[&str] = &[
    "immunosuppress",
    "immunodépress",
    "immunodepress",
    "cortico",
    "cortisone",
    "prednis",
    "biothérap",
    "biotherap",
    "biologique",
    "biologic",
    "anti-tnf",
    "méthotrexate",
    "methotrexate",
    "chimio",
    "chemo",
    "radiothérap",
    "ciclosporine",
    "tacrolimus",
    "rituximab",
];

const IMMUNODEFICIENCY_CONDITIONS: &[&str] = &[
    "immunodéfici",
    "immunodefici",
    "immunodépression",
    "immunodepression",
    "déficit immunitaire",
    "vih",
    "hiv",
    "sida",
    "greff",
    "transplant",
    "asplén",
    "asplen",
    "splénectom",
    "splenectom",
    "drépanocytose",
];

const ANTICOAGULANT_TREATMENTS: &[&str] = &[
    "anticoagul",
    "avk",
    "warfarin",
    "coumadin",
    "fluindione",
    "previscan",
    "apixaban",
    "eliquis",
    "rivaroxaban",
    "xarelto",
    "dabigatran",
    "héparine",
    "heparine",
    "heparin",
];

const ANAPHYLAXIS_TERMS: &[&str] = &[
    "anaphyla",
    "choc allergique",
    "quincke",
    "angio-œdème",
    "angioedème",
    "angioedema",
];

const EXPOSED_PROFESSIONS: &[&str] = &[
    "santé",
    "sante",
    "soignant",
    "médecin",
    "medecin",
    "infirmi",
    "pharmacien",
    "sage-femme",
    "kiné",
    "hôpital",
    "hopital",
    "laboratoire",
    "crèche",
    "creche",
    "petite enfance",
    "assistante maternelle",
    "assistant maternel",
    "garde d'enfant",
    "ehpad",
    "personnes âgées",
    "personnes agees",
    "maison de retraite",
    "healthcare",
    "childcare",
    "eldercare",
];

/// Select the retrieval queries for a patient.
///
/// Exactly one calendar query comes first and the intervals query comes
/// last; the conditional queries in between keep catalog order.
pub fn build_queries(profile: &PatientProfile) -> QueryList {
    let mut queries = QueryList::default();

    if is_pediatric(&profile.age_range) {
        queries.push(SearchQuery::PediatricCalendar);
    } else {
        queries.push(SearchQuery::AdultCalendar);
    }

    if concerns_pregnancy(profile) {
        queries.push(SearchQuery::Pregnancy);
    }

    if is_immunocompromised(profile) {
        queries.push(SearchQuery::LiveVaccineContraindications);
        queries.push(SearchQuery::Immunocompromised);
    }

    if profile.travel_plan.trim().chars().count() > 3 {
        queries.push(SearchQuery::Travel);
    }

    if is_affirmative(&profile.check_anticoagulants)
        || contains_any(&profile.current_treatments, ANTICOAGULANT_TREATMENTS)
    {
        queries.push(SearchQuery::Anticoagulants);
    }

    if is_affirmative(&profile.check_severe_allergy)
        || contains_any(&profile.allergy_history, ANAPHYLAXIS_TERMS)
    {
        queries.push(SearchQuery::Allergy);
    }

    if contains_any(&profile.profession, EXPOSED_PROFESSIONS) {
        queries.push(SearchQuery::Occupational);
    }

    queries.push(SearchQuery::Intervals);
    queries
}

fn concerns_pregnancy(profile: &PatientProfile) -> bool {
    indicates_pregnancy(&profile.pregnancy_status)
        || is_affirmative(&profile.check_pregnancy_or_postpartum)
        || FEMALE.contains(&normalize(&profile.sex).as_str())
}

fn is_immunocompromised(profile: &PatientProfile) -> bool {
    is_affirmative(&profile.check_immunosuppression)
        || contains_any(&profile.current_treatments, IMMUNOSUPPRESSIVE_TREATMENTS)
        || contains_any(&profile.chronic_conditions, IMMUNODEFICIENCY_CONDITIONS)
}

fn indicates_pregnancy(status: &str) -> bool {
    let status = normalize(status);
    let negated = status
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .is_some_and(|word| NEGATIONS.contains(&word));

    !negated && contains_any(&status, PREGNANCY_TERMS)
}

/// Pediatric keyword, or an age band lying below 18.
///
/// "moins de 18" and "<18" are exclusive bounds; a band such as "0-18 ans"
/// starts below 18 and ends at it at most; a lone age must be below 18.
fn is_pediatric(age_range: &str) -> bool {
    let text = normalize(age_range);
    if contains_any(&text, PEDIATRIC_TERMS) {
        return true;
    }

    let ages: Vec<u32> = text
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|digits| digits.parse().ok())
        .collect();
    let (Some(&first), Some(&last)) = (ages.first(), ages.last()) else {
        return false;
    };

    if BELOW_MARKERS.iter().any(|marker| text.contains(marker)) {
        return last <= ADULT_AGE;
    }

    if ages.len() > 1 {
        first < ADULT_AGE && last <= ADULT_AGE
    } else {
        first < ADULT_AGE
    }
}

fn is_affirmative(flag: &str) -> bool {
    let flag = normalize(flag);
    AFFIRMATIVE.contains(&flag.as_str()) || flag.starts_with("oui")
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    let text = normalize(text);
    !text.is_empty() && terms.iter().any(|term| text.contains(term))
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
