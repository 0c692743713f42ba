use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

/// Render a plain text template, values are inserted verbatim
pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    render(template, "inline_template", context_data)
}

/// Render an HTML template, escaping every inserted value
pub fn load_html_prompt<T: Serialize>(
    template: &str,
    context_data: &T,
) -> Result<String, TeraError> {
    // tera autoescapes templates whose name ends in .html
    render(template, "inline_template.html", context_data)
}

fn render<T: Serialize>(
    template: &str,
    name: &str,
    context_data: &T,
) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render(name, &context)?;
    Ok(rendered)
}
