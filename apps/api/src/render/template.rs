//! HTML résumé template, embedded in the binary and rendered with minijinja.
//!
//! The context is the canonical record JSON plus `logo_path`, the asset name the
//! render service receives alongside `index.html` (empty when there is no logo).

use minijinja::Environment;
use serde_json::Value;

use crate::models::resume::ResumeRecord;

const TEMPLATE_NAME: &str = "resume.html";

const RESUME_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ name | default("Resume") }}</title>
<style>
  @page { size: A4; margin: 18mm 16mm; }
  body { font-family: "Helvetica Neue", Arial, sans-serif; font-size: 10.5pt; color: #222; }
  header { border-bottom: 2px solid #1f3a5f; padding-bottom: 6px; margin-bottom: 10px; }
  header img.logo { float: right; max-height: 48px; }
  h1 { font-size: 20pt; margin: 0; color: #1f3a5f; }
  .contact { font-size: 9.5pt; color: #444; margin-top: 4px; }
  h2 { font-size: 12pt; text-transform: uppercase; color: #1f3a5f; border-bottom: 1px solid #ccc; margin: 14px 0 6px; }
  .entry { margin-bottom: 8px; page-break-inside: avoid; }
  .entry-head { display: flex; justify-content: space-between; font-weight: bold; }
  .entry-sub { font-style: italic; color: #444; }
  ul { margin: 3px 0 0 16px; padding: 0; }
  li { margin-bottom: 2px; }
</style>
</head>
<body>
<header>
  {% if logo_path %}<img class="logo" src="{{ logo_path }}" alt="">{% endif %}
  <h1>{{ name }}</h1>
  {% set contact = [email, phone, mobile, location, linkedin, website, github] | select | list %}
  {% if contact %}<div class="contact">{{ contact | join(" | ") }}</div>{% endif %}
  {% for line in contact_details | default([]) %}<div class="contact">{{ line }}</div>{% endfor %}
</header>

{% if experience %}
<section>
  <h2>Professional Experience</h2>
  {% for job in experience %}
  <div class="entry">
    <div class="entry-head"><span>{{ job.title }}</span><span>{{ job.dates }}</span></div>
    {% if job.company %}<div class="entry-sub">{{ job.company }}</div>{% endif %}
    {% if job.description %}<ul>{% for bullet in job.description %}<li>{{ bullet }}</li>{% endfor %}</ul>{% endif %}
  </div>
  {% endfor %}
</section>
{% endif %}

{% if education %}
<section>
  <h2>Education</h2>
  {% for edu in education %}
  <div class="entry">
    <div class="entry-head"><span>{{ edu.degree }}</span><span>{{ edu.dates }}</span></div>
    {% if edu.institution %}<div class="entry-sub">{{ edu.institution }}</div>{% endif %}
    {% if edu.details %}<ul>{% for detail in edu.details %}<li>{{ detail }}</li>{% endfor %}</ul>{% endif %}
  </div>
  {% endfor %}
</section>
{% endif %}

{% for section in other_sections %}
<section>
  <h2>{{ section.section_title }}</h2>
  {% if section.type == "list" %}
  <ul>{% for item in section.items %}<li>{{ item }}</li>{% endfor %}</ul>
  {% else %}
  {% for entry in section.entries %}
  <div class="entry">
    <div class="entry-head"><span>{{ entry.title }}</span><span>{{ entry.dates }}</span></div>
    {% if entry.organization %}<div class="entry-sub">{{ entry.organization }}</div>{% endif %}
    {% if entry.description %}<ul>{% for line in entry.description %}<li>{{ line }}</li>{% endfor %}</ul>{% endif %}
  </div>
  {% endfor %}
  {% endif %}
</section>
{% endfor %}
</body>
</html>
"#;

fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, RESUME_TEMPLATE)?;
    Ok(env)
}

/// Renders the record to a standalone HTML page. Text is HTML-escaped.
pub fn render_html(record: &ResumeRecord, logo_path: Option<&str>) -> Result<String, minijinja::Error> {
    let env = environment()?;
    let mut ctx = record.to_value();
    if let Value::Object(map) = &mut ctx {
        map.insert(
            "logo_path".to_string(),
            Value::String(logo_path.unwrap_or_default().to_string()),
        );
    }
    env.get_template(TEMPLATE_NAME)?.render(ctx)
}
