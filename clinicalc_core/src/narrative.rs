//! Deterministic text assembly for clinician-facing interpretations.

/// Builder for an interpretation narrative.
///
/// Sections are rendered in insertion order as a heading followed by
/// bullet lines; paragraphs are free text separated by blank lines.
#[derive(Debug, Default)]
pub struct Narrative {
    out: String,
}

impl Narrative {
    pub fn new(title: &str) -> Self {
        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(&"=".repeat(title.chars().count()));
        out.push('\n');
        Self { out }
    }

    pub fn paragraph(mut self, text: impl AsRef<str>) -> Self {
        self.out.push('\n');
        self.out.push_str(text.as_ref());
        self.out.push('\n');
        self
    }

    /// Append a titled bullet list. Empty lists are skipped.
    pub fn section<I, S>(mut self, heading: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut body = String::new();
        for item in items {
            body.push_str("- ");
            body.push_str(item.as_ref());
            body.push('\n');
        }
        if body.is_empty() {
            return self;
        }
        self.out.push('\n');
        self.out.push_str(heading);
        self.out.push_str(":\n");
        self.out.push_str(&body);
        self
    }

    /// Append a section only when `condition` holds
    pub fn section_if<I, S>(self, condition: bool, heading: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if condition {
            self.section(heading, items)
        } else {
            self
        }
    }

    pub fn finish(self) -> String {
        self.out.trim_end().to_string()
    }
}

/// Narrative for a result that lacks the values a calculator needs
pub fn incomplete(name: &str) -> String {
    Narrative::new(name)
        .paragraph(
            "Resultado incompleto: faltan valores calculados necesarios para la interpretación. \
             Repita el cálculo con datos válidos.",
        )
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_render_in_order() {
        let text = Narrative::new("Prueba")
            .paragraph("Intro")
            .section("Acciones", ["uno", "dos"])
            .section("Vacía", Vec::<String>::new())
            .section_if(false, "Oculta", ["x"])
            .finish();

        assert_eq!(
            text,
            "Prueba\n======\n\nIntro\n\nAcciones:\n- uno\n- dos"
        );
    }

    #[test]
    fn test_incomplete_mentions_name() {
        assert!(incomplete("IMC").starts_with("IMC\n==="));
    }
}
