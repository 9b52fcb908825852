// src/summary.rs
//! Compact, storage-safe descriptions of a generation: the parameter
//! summary and the ingredient category classification.

use crate::catalog::{self, PresentationLevel, describe};
use crate::models::GenerationParameters;

/// Storage field limit for the parameter summary, in characters.
pub const SUMMARY_MAX_CHARS: usize = 200;

const EMPTY_SUMMARY: &str = "Sin parametros";
const ELLIPSIS: &str = "...";

/// Category keyword lists, in emission order.
const INGREDIENT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "vegetales",
        &[
            "tomate", "lechuga", "cebolla", "ajo", "pimiento", "zanahoria", "calabacin",
            "berenjena", "espinaca", "brocoli", "champinon", "seta", "patata", "pepino",
            "rucula", "repollo", "coliflor", "apio", "puerro", "alcachofa", "esparrago",
            "calabaza", "albahaca", "perejil", "verdura",
        ],
    ),
    (
        "lacteos",
        &[
            "queso", "leche", "mozzarella", "nata", "yogur", "mantequilla", "crema",
            "parmesano", "burrata", "ricotta",
        ],
    ),
    (
        "carne",
        &[
            "pollo", "ternera", "cerdo", "cordero", "jamon", "chorizo", "bacon", "carne",
            "pavo", "panceta", "salchicha", "pato", "conejo", "solomillo",
        ],
    ),
    (
        "pescado",
        &[
            "salmon", "atun", "merluza", "bacalao", "gamba", "langostino", "pulpo", "calamar",
            "mejillon", "pescado", "marisco", "sardina", "anchoa", "trucha", "dorada", "lubina",
        ],
    ),
    (
        "cereales",
        &[
            "arroz", "pan", "pasta", "trigo", "avena", "maiz", "quinoa", "harina", "cuscus",
            "cebada", "centeno", "espagueti", "fideo",
        ],
    ),
    (
        "frutas",
        &[
            "manzana", "platano", "fresa", "naranja", "limon", "uva", "mango", "pina",
            "melocoton", "pera", "frambuesa", "arandano", "kiwi", "sandia", "melon", "cereza",
            "aguacate",
        ],
    ),
    (
        "legumbres",
        &[
            "garbanzo", "lenteja", "judia", "alubia", "frijol", "soja", "guisante", "haba",
            "edamame",
        ],
    ),
];

const UNCATEGORIZED: &str = "otros";

/// Short human-readable description of the parameters, safe for a
/// 200-character text field.
pub fn summarize(params: &GenerationParameters) -> String {
    let parts: Vec<String> = [
        describe(catalog::STYLE, params.style.as_deref()),
        params.intensity.map(|i| {
            format!("intensidad {}", PresentationLevel::from_intensity(i).short_label())
        }),
        describe(catalog::LIGHTING, params.lighting.as_deref()),
        describe(catalog::BACKGROUND, params.background.as_deref()),
        describe(catalog::CAMERA_ANGLE, params.camera_angle.as_deref()),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect();

    if parts.is_empty() {
        return EMPTY_SUMMARY.to_string();
    }

    let cleaned = sanitize(&strip_accents(&parts.join(", ")));
    if cleaned.is_empty() {
        return EMPTY_SUMMARY.to_string();
    }
    truncate_chars(&cleaned, SUMMARY_MAX_CHARS)
}

/// Comma-joined ingredient categories found in `ingredients`, or `otros`.
pub fn classify_ingredients(ingredients: &str) -> String {
    let normalized = strip_accents(&ingredients.to_lowercase());
    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    let found: Vec<&str> = INGREDIENT_CATEGORIES
        .iter()
        .filter(|(_, keywords)| {
            keywords
                .iter()
                .any(|k| words.iter().any(|word| names_ingredient(word, k)))
        })
        .map(|(category, _)| *category)
        .collect();

    if found.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        found.join(", ")
    }
}

/// A whole word equal to the keyword or its plural (`-s`, `-es`).
fn names_ingredient(word: &str, keyword: &str) -> bool {
    match word.strip_prefix(keyword) {
        Some(suffix) => matches!(suffix, "" | "s" | "es"),
        None => false,
    }
}

/// Replace Spanish accented letters with their plain counterparts.
pub fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'ñ' => 'n',
            'Ñ' => 'N',
            'ç' => 'c',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

/// Drop control characters and collapse runs of whitespace.
fn sanitize(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max - ELLIPSIS.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
