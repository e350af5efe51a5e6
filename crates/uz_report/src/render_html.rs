//! HTML renderer: one embedded template, no external assets. The template name
//! ends in `.html`, so minijinja escapes every interpolated value.

use minijinja::{context, Environment};

use crate::{ReportError, ReportModel};

static TEMPLATE: &str = r#"<!doctype html>
<html lang="en"><meta charset="utf-8">
<title>{{ m.cover.title }} ({{ m.integrity.result_id }})</title>
<h1>{{ m.cover.title }}</h1>
<p>Source: {{ m.cover.source }}. Policies: {{ m.cover.policies | join(", ") }}.
{% if m.cover.exclude_unlikely %}Parcels unlikely to redevelop are excluded.{% else %}All eligible parcels are counted.{% endif %}</p>

<h2>Totals</h2>
<table>
  <tr><th>Parcels</th><td>{{ m.totals.parcels }}</td></tr>
  <tr><th>Potential units</th><td>{{ m.totals.units }}</td></tr>
  <tr><th>Units under current zoning</th><td>{{ m.totals.baseline_units }}</td></tr>
  <tr><th>Additional units</th><td>{{ m.totals.additional_units }}</td></tr>
  <tr><th>Acres</th><td>{{ m.totals.acres }}</td></tr>
</table>

{% for section in [["By policy group", m.groups], ["By density tier", m.tiers]] %}
<h2>{{ section[0] }}</h2>
<table>
  <tr><th></th><th>Parcels</th><th>Units</th><th>Acres</th></tr>
  {% for r in section[1] %}<tr><td>{{ r.name }}</td><td>{{ r.parcels }}</td><td>{{ r.units }}</td><td>{{ r.acres }}</td></tr>
  {% endfor %}
</table>
{% endfor %}

<h2>Policy passes</h2>
{% for p in m.passes %}
<h3>{{ p.policy }}</h3>
<p>Candidates {{ p.candidates }}, qualified {{ p.qualified }}, excluded {{ p.excluded }}, won {{ p.won }}.</p>
<ul>{% for r in p.rings %}<li>{{ r.name }}: {{ r.parcels }} parcels, {{ r.units }} units</li>{% endfor %}</ul>
{% endfor %}

{% if m.warnings %}
<h2>Input warnings</h2>
<ul>{% for w in m.warnings %}<li>{{ w }}</li>{% endfor %}</ul>
{% endif %}

<h2>Integrity</h2>
<p>Result {{ m.integrity.result_id }}</p>
<p>Parcels sha256 {{ m.integrity.parcels_sha256 }}; policies sha256 {{ m.integrity.policies_sha256 }}</p>
<p>Engine {{ m.integrity.engine }}</p>
</html>
"#;

pub fn render_html(model: &ReportModel) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.add_template("report.html", TEMPLATE)
        .map_err(|e| ReportError::Template(format!("add_template: {e}")))?;
    let tmpl = env
        .get_template("report.html")
        .map_err(|e| ReportError::Template(format!("get_template: {e}")))?;
    tmpl.render(context! { m => model })
        .map_err(|e| ReportError::Template(format!("render_html: {e}")))
}
