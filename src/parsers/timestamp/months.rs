//! Month names across the export locales we see in practice

/// English month tokens, also used to build the primary patterns
pub const ENGLISH_MONTH_PATTERN: &str = r"(?i:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?";

/// Month number for an English month token (abbreviated or full)
pub fn english_month(token: &str) -> Option<u32> {
    let token = normalize(token);
    let month = match token.as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// Month number for a month token in English, French, German, Spanish,
/// Portuguese, Italian or Dutch
pub fn month_from_name(token: &str) -> Option<u32> {
    if let Some(month) = english_month(token) {
        return Some(month);
    }
    let token = normalize(token);
    let month = match token.as_str() {
        "janv" | "janvier" | "januar" | "jän" | "jänner" | "ene" | "enero" | "janeiro"
        | "gen" | "gennaio" | "januari" => 1,
        "févr" | "fév" | "fevr" | "février" | "fevrier" | "februar" | "febrero" | "fev"
        | "fevereiro" | "febbraio" | "februari" => 2,
        "mars" | "märz" | "mär" | "mrz" | "marzo" | "março" | "marco" | "mrt" | "maart" => 3,
        "avr" | "avril" | "abr" | "abril" | "aprile" => 4,
        "mai" | "mayo" | "maio" | "mag" | "maggio" | "mei" => 5,
        "juin" | "juni" | "junio" | "junho" | "giu" | "giugno" => 6,
        "juil" | "juillet" | "juli" | "julio" | "julho" | "lug" | "luglio" => 7,
        "août" | "aout" | "ago" | "agosto" | "augustus" => 8,
        "septembre" | "septiembre" | "set" | "setembro" | "settembre" => 9,
        "oktober" | "okt" | "octobre" | "octubre" | "out" | "outubro" | "ott" | "ottobre" => 10,
        "novembre" | "noviembre" | "novembro" => 11,
        "déc" | "décembre" | "decembre" | "dez" | "dezember" | "dic" | "diciembre"
        | "dezembro" | "dicembre" => 12,
        _ => return None,
    };
    Some(month)
}

fn normalize(token: &str) -> String {
    token.trim().trim_end_matches('.').to_lowercase()
}
