// src/catalog.rs
//! Closed vocabularies for the style parameters and the Spanish phrases
//! they render to. Values missing from a table pass through verbatim.

/// Sentinel the UI sends when the user has no preference for a field.
pub const NO_PREFERENCE: &str = "sin-preferencia";

pub type Vocabulary = &'static [(&'static str, &'static str)];

pub const STYLE: Vocabulary = &[
    ("rustico", "estilo rústico y casero"),
    ("moderno", "estilo moderno y minimalista de alta cocina"),
    ("elegante", "estilo elegante y sofisticado"),
    ("tradicional", "estilo tradicional y familiar"),
    ("minimalista", "estilo minimalista con mucho espacio negativo"),
    ("gourmet", "estilo gourmet de restaurante con estrella Michelin"),
    ("callejero", "estilo street food desenfadado"),
];

pub const LIGHTING: Vocabulary = &[
    ("natural", "luz natural suave de ventana"),
    ("estudio", "iluminación de estudio profesional"),
    ("calida", "luz cálida y acogedora"),
    ("fria", "luz fría y limpia"),
    ("dramatica", "iluminación dramática con sombras marcadas"),
    ("contraluz", "contraluz que resalta texturas y vapor"),
];

pub const BACKGROUND: Vocabulary = &[
    ("blanco", "fondo blanco limpio"),
    ("madera", "superficie de madera rústica"),
    ("marmol", "encimera de mármol blanco"),
    ("oscuro", "fondo oscuro y elegante"),
    ("pizarra", "fondo de pizarra negra"),
    ("mantel", "mantel de lino natural"),
    ("restaurante", "interior de restaurante desenfocado"),
];

pub const CAMERA_ANGLE: Vocabulary = &[
    ("cenital", "vista cenital desde arriba"),
    ("45", "ángulo de 45 grados"),
    ("frontal", "vista frontal a la altura del plato"),
    ("lateral", "vista lateral"),
    ("primer-plano", "primer plano macro de los detalles"),
];

pub const DISHWARE_TYPE: Vocabulary = &[
    ("plato-llano", "plato llano"),
    ("plato-hondo", "plato hondo"),
    ("bowl", "bowl"),
    ("tabla", "tabla de madera"),
    ("pizarra", "pizarra de servir"),
    ("sarten", "sartén de hierro"),
    ("cazuela", "cazuela de barro"),
];

pub const DISHWARE_COLOR: Vocabulary = &[
    ("blanco", "blanca"),
    ("negro", "negra mate"),
    ("terracota", "de terracota"),
    ("azul", "azul artesanal"),
    ("transparente", "de cristal transparente"),
];

pub const AMBIENCE: Vocabulary = &[
    ("restaurante", "restaurante de alta cocina"),
    ("casero", "comedor casero y acogedor"),
    ("terraza", "terraza al aire libre"),
    ("picnic", "picnic en el campo"),
    ("cocina-profesional", "cocina profesional en pleno servicio"),
];

pub const TIME_OF_DAY: Vocabulary = &[
    ("manana", "luz de la mañana"),
    ("mediodia", "luz intensa de mediodía"),
    ("atardecer", "luz dorada del atardecer"),
    ("noche", "ambiente nocturno con velas"),
];

pub const DEPTH_OF_FIELD: Vocabulary = &[
    ("bajo", "profundidad de campo reducida con fondo desenfocado (bokeh)"),
    ("medio", "profundidad de campo media"),
    ("alto", "todo el plato y el fondo enfocados"),
];

pub const ASPECT_RATIO: Vocabulary = &[
    ("1:1", "formato cuadrado 1:1"),
    ("4:3", "formato horizontal 4:3"),
    ("3:4", "formato vertical 3:4"),
    ("16:9", "formato panorámico 16:9"),
    ("9:16", "formato vertical 9:16 para redes sociales"),
];

pub const STEAM_EFFECT: Vocabulary = &[
    ("ninguno", "sin vapor"),
    ("sutil", "un ligero vapor saliendo del plato"),
    ("intenso", "vapor abundante que sugiere el plato recién hecho"),
];

pub const FRESHNESS_EFFECT: Vocabulary = &[
    ("ninguno", "sin efectos de frescura"),
    ("gotas", "pequeñas gotas de agua que transmiten frescura"),
    ("brillo", "brillo jugoso en los alimentos"),
];

pub const SATURATION: Vocabulary = &[
    ("natural", "colores naturales"),
    ("vibrante", "colores vibrantes y saturados"),
    ("suave", "colores suaves y desaturados"),
];

pub const BACKGROUND_TEXTURE: Vocabulary = &[
    ("lisa", "textura lisa"),
    ("rugosa", "textura rugosa"),
    ("textil", "textura textil"),
    ("metalica", "textura metálica"),
];

pub const LIGHT_DIRECTION: Vocabulary = &[
    ("lateral", "luz lateral"),
    ("trasera", "luz trasera"),
    ("frontal", "luz frontal"),
    ("superior", "luz superior"),
];

pub const EXTRA_DECORATIONS: Vocabulary = &[
    ("hierbas", "hierbas frescas"),
    ("flores-comestibles", "flores comestibles"),
    ("salsa", "trazos de salsa decorativos"),
    ("especias", "especias espolvoreadas"),
    ("microgreens", "brotes tiernos (microgreens)"),
    ("aceite", "gotas de aceite de oliva"),
];

pub const PROPS: Vocabulary = &[
    ("cubiertos", "cubiertos elegantes"),
    ("servilleta", "servilleta de tela"),
    ("copa-vino", "copa de vino"),
    ("ingredientes-crudos", "ingredientes crudos alrededor del plato"),
    ("tabla-cortar", "tabla de cortar"),
    ("especiero", "especiero"),
];

pub const CUISINE_TYPE: Vocabulary = &[
    ("italiana", "italiana"),
    ("mexicana", "mexicana"),
    ("japonesa", "japonesa"),
    ("espanola", "española"),
    ("francesa", "francesa"),
    ("mediterranea", "mediterránea"),
    ("asiatica", "asiática"),
    ("peruana", "peruana"),
];

pub const DISH_CATEGORY: Vocabulary = &[
    ("entrante", "entrante"),
    ("principal", "plato principal"),
    ("postre", "postre"),
    ("ensalada", "ensalada"),
    ("sopa", "sopa o crema"),
    ("desayuno", "desayuno"),
];

pub const COOKING_TECHNIQUE: Vocabulary = &[
    ("horneado", "horneado"),
    ("parrilla", "a la parrilla"),
    ("frito", "frito"),
    ("vapor", "al vapor"),
    ("crudo", "crudo"),
    ("guisado", "guisado a fuego lento"),
    ("salteado", "salteado"),
];

pub const CULINARY_TAGS: Vocabulary = &[
    ("vegetariano", "vegetariano"),
    ("vegano", "vegano"),
    ("sin-gluten", "sin gluten"),
    ("saludable", "saludable"),
    ("picante", "picante"),
    ("comfort-food", "comfort food"),
];

/// True when a value carries no preference: blank or the sentinel.
pub fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(NO_PREFERENCE)
}

/// Resolve a vocabulary value to its phrase, or `None` when unset.
pub fn describe(vocabulary: Vocabulary, value: Option<&str>) -> Option<String> {
    let value = value.filter(|v| !is_unset(v))?.trim();
    let phrase = vocabulary
        .iter()
        .find(|(key, _)| *key == value)
        .map(|(_, phrase)| *phrase)
        .unwrap_or(value);
    Some(phrase.to_string())
}

/// Resolve every member of a set, skipping unset members. `None` when
/// nothing remains.
pub fn describe_all(vocabulary: Vocabulary, values: &[String]) -> Option<String> {
    let phrases: Vec<String> = values
        .iter()
        .filter_map(|v| describe(vocabulary, Some(v)))
        .collect();
    if phrases.is_empty() {
        None
    } else {
        Some(phrases.join(", "))
    }
}

/// Three-tier presentation level derived from `intensity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationLevel {
    Subtle,
    Moderate,
    Extreme,
}

impl PresentationLevel {
    pub fn from_intensity(intensity: i64) -> Self {
        if intensity <= 3 {
            PresentationLevel::Subtle
        } else if intensity <= 7 {
            PresentationLevel::Moderate
        } else {
            PresentationLevel::Extreme
        }
    }

    pub fn phrase(self) -> &'static str {
        match self {
            PresentationLevel::Subtle => "presentación casual y natural",
            PresentationLevel::Moderate => "presentación gourmet moderada",
            PresentationLevel::Extreme => "presentación profesional de alta cocina",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            PresentationLevel::Subtle => "sutil",
            PresentationLevel::Moderate => "moderado",
            PresentationLevel::Extreme => "extremo",
        }
    }
}
