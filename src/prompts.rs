// src/prompts.rs
//! Prompt text sent to the generative models. Every builder here is pure
//! and total: unset fields are left out, never rendered blank.

use crate::catalog::{self, PresentationLevel, describe, describe_all};
use crate::models::GenerationParameters;

const INGREDIENT_DETECTION_PROMPT: &str = "Identifica todos los ingredientes visibles en esta \
imagen de comida. Responde únicamente con una lista de ingredientes separados por comas, en \
español y en minúsculas, sin numeración, sin explicaciones y sin texto adicional. \
Ejemplo: tomate, mozzarella, albahaca, aceite de oliva";

const DESIRED_OUTCOME: &str = "RESULTADO DESEADO: una fotografía gastronómica de calidad \
editorial, apetecible y realista, del mismo plato con exactamente los mismos ingredientes, \
presentado según las especificaciones anteriores.";

/// Constant instruction for the ingredient detection call.
pub fn build_ingredient_detection_prompt() -> &'static str {
    INGREDIENT_DETECTION_PROMPT
}

/// Prompt for re-styling an uploaded dish photo. The ingredients text is
/// quoted verbatim so the model keeps the food untouched.
pub fn build_image_prompt(params: &GenerationParameters, ingredients: &str) -> String {
    let mut sections = Vec::with_capacity(4);

    sections.push(
        "Transforma esta fotografía de comida en una fotografía gastronómica profesional."
            .to_string(),
    );

    let invariance = if ingredients.trim().is_empty() {
        "REGLA FUNDAMENTAL: la comida debe permanecer idéntica a la de la fotografía original."
            .to_string()
    } else {
        format!(
            "REGLA FUNDAMENTAL: la comida debe permanecer idéntica. El plato contiene \
             exactamente estos ingredientes: {ingredients}."
        )
    };
    sections.push(format!(
        "{invariance} No añadas, quites ni sustituyas ningún ingrediente y no cambies su forma, \
         cantidad ni punto de cocción. Solo puede cambiar la presentación: la vajilla, el fondo, \
         la iluminación, el ángulo de cámara y la decoración."
    ));

    if let Some(block) = specifications_block(params) {
        sections.push(block);
    }
    sections.push(DESIRED_OUTCOME.to_string());

    sections.join("\n\n")
}

/// Prompt for generating a dish photo from a text description alone.
pub fn build_scratch_image_prompt(idea: &str, params: &GenerationParameters) -> String {
    let mut sections = vec![format!(
        "Genera una fotografía gastronómica profesional del siguiente plato: {}.",
        idea.trim()
    )];
    if let Some(block) = specifications_block(params) {
        sections.push(block);
    }
    sections.push(
        "RESULTADO DESEADO: una fotografía realista y apetecible, de calidad editorial, que \
         muestre el plato descrito según las especificaciones anteriores."
            .to_string(),
    );
    sections.join("\n\n")
}

/// Prompt asking the text model for a Markdown recipe.
pub fn build_recipe_prompt(
    idea: Option<&str>,
    params: &GenerationParameters,
    ingredients: &str,
) -> String {
    let dish = idea
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .unwrap_or("el plato que se puede preparar con los ingredientes indicados");

    let context = [
        ("Tipo de cocina", describe_all(catalog::CUISINE_TYPE, &params.cuisine_type)),
        ("Categoría del plato", describe_all(catalog::DISH_CATEGORY, &params.dish_category)),
        (
            "Técnica culinaria",
            describe_all(catalog::COOKING_TECHNIQUE, &params.cooking_technique),
        ),
        ("Etiquetas culinarias", describe_all(catalog::CULINARY_TAGS, &params.culinary_tags)),
        ("Ingredientes", non_blank(ingredients)),
        ("Estilo visual", describe(catalog::STYLE, params.style.as_deref())),
        ("Ambiente", describe(catalog::AMBIENCE, params.ambience.as_deref())),
        ("Momento del día", describe(catalog::TIME_OF_DAY, params.time_of_day.as_deref())),
        (
            "Nivel de presentación",
            params
                .intensity
                .map(|i| PresentationLevel::from_intensity(i).phrase().to_string()),
        ),
    ];

    let mut prompt = format!(
        "Eres un chef profesional. Escribe una receta completa en formato Markdown para: {dish}.\n"
    );
    let lines = labelled_lines(context);
    if !lines.is_empty() {
        prompt.push_str("\nCONTEXTO:\n");
        prompt.push_str(&lines.join("\n"));
        prompt.push('\n');
    }
    prompt.push_str(
        "\nLa receta debe incluir, con encabezados Markdown:\n\
         ## Título del plato\n\
         ## Descripción (dos o tres frases)\n\
         ## Ingredientes (lista con cantidades para 4 personas)\n\
         ## Preparación (pasos numerados)\n\
         ## Emplatado (cómo presentarlo según el nivel de presentación indicado)\n\
         ## Consejos del chef\n\n\
         Responde únicamente con la receta en Markdown, sin comentarios adicionales.",
    );
    prompt
}

/// `ESPECIFICACIONES:` block, one line per set field in a fixed order.
/// Destructured exhaustively so a new parameter cannot be forgotten here.
fn specifications_block(params: &GenerationParameters) -> Option<String> {
    let GenerationParameters {
        intensity,
        style,
        lighting,
        background,
        camera_angle,
        dishware_type,
        dishware_color,
        ambience,
        time_of_day,
        depth_of_field,
        aspect_ratio,
        steam_effect,
        freshness_effect,
        saturation,
        background_texture,
        light_direction,
        extra_decorations,
        props,
        cuisine_type,
        dish_category,
        cooking_technique,
        culinary_tags,
    } = params;

    let entries = [
        ("Estilo", describe(catalog::STYLE, style.as_deref())),
        (
            "Nivel de transformación",
            intensity.map(|i| {
                format!("{i}/10, {}", PresentationLevel::from_intensity(i).phrase())
            }),
        ),
        ("Iluminación", describe(catalog::LIGHTING, lighting.as_deref())),
        ("Dirección de la luz", describe(catalog::LIGHT_DIRECTION, light_direction.as_deref())),
        ("Fondo", describe(catalog::BACKGROUND, background.as_deref())),
        (
            "Textura del fondo",
            describe(catalog::BACKGROUND_TEXTURE, background_texture.as_deref()),
        ),
        ("Ángulo de cámara", describe(catalog::CAMERA_ANGLE, camera_angle.as_deref())),
        ("Vajilla", describe(catalog::DISHWARE_TYPE, dishware_type.as_deref())),
        ("Color de la vajilla", describe(catalog::DISHWARE_COLOR, dishware_color.as_deref())),
        ("Ambiente", describe(catalog::AMBIENCE, ambience.as_deref())),
        ("Momento del día", describe(catalog::TIME_OF_DAY, time_of_day.as_deref())),
        ("Profundidad de campo", describe(catalog::DEPTH_OF_FIELD, depth_of_field.as_deref())),
        ("Formato", describe(catalog::ASPECT_RATIO, aspect_ratio.as_deref())),
        ("Vapor", describe(catalog::STEAM_EFFECT, steam_effect.as_deref())),
        ("Frescura", describe(catalog::FRESHNESS_EFFECT, freshness_effect.as_deref())),
        ("Saturación", describe(catalog::SATURATION, saturation.as_deref())),
        (
            "Decoración adicional",
            describe_all(catalog::EXTRA_DECORATIONS, extra_decorations),
        ),
        ("Accesorios", describe_all(catalog::PROPS, props)),
        ("Tipo de cocina", describe_all(catalog::CUISINE_TYPE, cuisine_type)),
        ("Categoría del plato", describe_all(catalog::DISH_CATEGORY, dish_category)),
        ("Técnica culinaria", describe_all(catalog::COOKING_TECHNIQUE, cooking_technique)),
        ("Etiquetas culinarias", describe_all(catalog::CULINARY_TAGS, culinary_tags)),
    ];

    let lines = labelled_lines(entries);
    if lines.is_empty() {
        None
    } else {
        Some(format!("ESPECIFICACIONES:\n{}", lines.join("\n")))
    }
}

fn labelled_lines<const N: usize>(entries: [(&str, Option<String>); N]) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|(label, phrase)| phrase.map(|p| format!("- {label}: {p}")))
        .collect()
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NO_PREFERENCE;

    fn base_params() -> GenerationParameters {
        GenerationParameters {
            intensity: Some(5),
            style: Some("moderno".to_string()),
            lighting: Some("natural".to_string()),
            background: Some("blanco".to_string()),
            camera_angle: Some("45".to_string()),
            ..GenerationParameters::default()
        }
    }

    #[test]
    fn image_prompt_renders_mapped_phrases_and_ingredients() {
        let prompt = build_image_prompt(&base_params(), "tomate, mozzarella");
        assert!(prompt.contains("tomate, mozzarella"));
        assert!(prompt.contains("estilo moderno y minimalista de alta cocina"));
        assert!(prompt.contains("fondo blanco limpio"));
        assert!(prompt.contains("- Ángulo de cámara: ángulo de 45 grados"));
        assert!(prompt.contains("5/10, presentación gourmet moderada"));
    }

    #[test]
    fn ingredients_are_quoted_exactly_as_received() {
        let ingredients = "  tomate ,  mozzarella di bufala\t";
        let prompt = build_image_prompt(&base_params(), ingredients);
        assert!(prompt.contains(&format!("exactamente estos ingredientes: {ingredients}.")));

        let blank = build_image_prompt(&base_params(), "   ");
        assert!(!blank.contains("exactamente estos ingredientes"));
    }

    #[test]
    fn image_prompt_sections_keep_their_order() {
        let prompt = build_image_prompt(&base_params(), "arroz, gambas");
        let invariance = prompt.find("REGLA FUNDAMENTAL").unwrap();
        let specs = prompt.find("ESPECIFICACIONES:").unwrap();
        let outcome = prompt.find("RESULTADO DESEADO").unwrap();
        assert!(invariance < specs && specs < outcome);

        let style = prompt.find("- Estilo:").unwrap();
        let lighting = prompt.find("- Iluminación:").unwrap();
        let background = prompt.find("- Fondo:").unwrap();
        let angle = prompt.find("- Ángulo de cámara:").unwrap();
        assert!(style < lighting && lighting < background && background < angle);
    }

    #[test]
    fn no_preference_fields_are_omitted() {
        let mut params = base_params();
        params.ambience = Some(NO_PREFERENCE.to_string());
        params.time_of_day = Some(String::new());
        params.props = vec![NO_PREFERENCE.to_string()];
        let prompt = build_image_prompt(&params, "pollo");
        assert!(!prompt.contains("Ambiente:"));
        assert!(!prompt.contains("Momento del día:"));
        assert!(!prompt.contains("Accesorios:"));
        assert!(!prompt.contains(": \n"));
    }

    #[test]
    fn set_fields_render_when_present() {
        let mut params = base_params();
        params.ambience = Some("terraza".to_string());
        params.extra_decorations = vec!["hierbas".to_string(), "oro comestible".to_string()];
        let prompt = build_image_prompt(&params, "pollo");
        assert!(prompt.contains("- Ambiente: terraza al aire libre"));
        assert!(prompt.contains("- Decoración adicional: hierbas frescas, oro comestible"));
    }

    #[test]
    fn unmapped_values_pass_through() {
        let mut params = base_params();
        params.lighting = Some("neón".to_string());
        let prompt = build_image_prompt(&params, "sushi");
        assert!(prompt.contains("- Iluminación: neón"));
    }

    #[test]
    fn empty_parameters_still_produce_a_prompt() {
        let prompt = build_image_prompt(&GenerationParameters::default(), "");
        assert!(prompt.contains("REGLA FUNDAMENTAL"));
        assert!(!prompt.contains("ESPECIFICACIONES"));
        assert!(prompt.contains("RESULTADO DESEADO"));
    }

    #[test]
    fn detection_prompt_asks_for_a_bare_list() {
        let prompt = build_ingredient_detection_prompt();
        assert!(prompt.contains("separados por comas"));
        assert!(prompt.contains("sin explicaciones"));
    }

    #[test]
    fn recipe_prompt_includes_context_and_presentation_level() {
        let mut params = base_params();
        params.intensity = Some(9);
        params.cuisine_type = vec!["italiana".to_string()];
        params.dish_category = vec!["principal".to_string()];
        params.cooking_technique = vec!["horneado".to_string()];
        params.culinary_tags = vec!["vegetariano".to_string()];
        params.ambience = Some("casero".to_string());
        params.time_of_day = Some("noche".to_string());

        let prompt = build_recipe_prompt(Some("lasaña"), &params, "pasta, tomate, queso");
        assert!(prompt.contains("Markdown para: lasaña"));
        assert!(prompt.contains("- Tipo de cocina: italiana"));
        assert!(prompt.contains("- Categoría del plato: plato principal"));
        assert!(prompt.contains("- Técnica culinaria: horneado"));
        assert!(prompt.contains("- Etiquetas culinarias: vegetariano"));
        assert!(prompt.contains("- Ingredientes: pasta, tomate, queso"));
        assert!(prompt.contains("- Ambiente: comedor casero y acogedor"));
        assert!(prompt.contains("- Momento del día: ambiente nocturno con velas"));
        assert!(prompt.contains("presentación profesional de alta cocina"));
    }

    #[test]
    fn recipe_prompt_omits_absent_context() {
        let prompt = build_recipe_prompt(None, &GenerationParameters::default(), "  ");
        assert!(!prompt.contains("CONTEXTO:"));
        assert!(prompt.contains("ingredientes indicados"));
    }

    #[test]
    fn scratch_prompt_describes_the_idea() {
        let prompt = build_scratch_image_prompt("tarta de queso", &base_params());
        assert!(prompt.starts_with("Genera una fotografía"));
        assert!(prompt.contains("tarta de queso"));
        assert!(prompt.contains("ESPECIFICACIONES:"));
    }
}
