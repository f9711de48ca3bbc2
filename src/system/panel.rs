use crate::format::{
    format_density, format_distance, format_period, format_pressure, format_temperature,
};
use crate::system::api::DataService;
use crate::system::body::{BodyId, CelestialBody, StarId};
use std::fmt::Write;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceView {
    pub icon_url: String,
    pub name: String,
    pub density: String,
}

/// Everything shown for a body except the map, derived once from the record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyPanel {
    pub id: BodyId,
    pub rows: Vec<DataRow>,
    pub description: String,
    pub resources: Vec<ResourceView>,
    pub icon_width: u32,
}

impl BodyPanel {
    pub fn new(body: &CelestialBody, service: &DataService, icon_width: u32) -> Self {
        let resources = body
            .resources
            .iter()
            .map(|r| ResourceView {
                icon_url: service.icon_url(&r.commodity.image),
                name: r.commodity.name.clone(),
                density: format!("{}%", format_density(r.density)),
            })
            .collect();

        Self {
            id: body.id,
            rows: data_rows(body),
            description: body.description.clone(),
            resources,
            icon_width,
        }
    }

    pub fn row(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }

    /// Pane body: map viewport, data list, description and resources.
    pub fn render(&self) -> String {
        let id = self.id;
        let mut html = String::new();
        let _ = write!(
            html,
            "<div id=\"outermap-{id}\"><div id=\"{}\" class=\"planet-map\"></div></div>",
            map_viewport_id(id)
        );

        let _ = write!(html, "<dl id=\"planet-data-{id}\" class=\"data-block\">");
        for row in &self.rows {
            let _ = write!(
                html,
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(row.label),
                escape_html(&row.value)
            );
        }
        html.push_str("</dl>");

        let _ = write!(
            html,
            "<p style=\"clear:left\">{}</p>",
            escape_html(&self.description)
        );

        let _ = write!(
            html,
            "<div id=\"resources-list-{id}\" class=\"planet-resources\"><ul id=\"resources-{id}\" class=\"resource-list\">"
        );
        for resource in &self.resources {
            let _ = write!(
                html,
                "<li><img src=\"{}\" title=\"{}\" width=\"{}px\"/><br/><span>{}</span></li>",
                escape_html(&resource.icon_url),
                escape_html(&resource.name),
                self.icon_width,
                escape_html(&resource.density)
            );
        }
        html.push_str("</ul></div><div style=\"clear:both\"></div>");
        html
    }
}

fn data_rows(body: &CelestialBody) -> Vec<DataRow> {
    let mut rows = Vec::new();
    let mut push = |label: &'static str, value: String| rows.push(DataRow { label, value });

    push("Type", body.kind.clone());
    push("Distance", format_distance(body.distance));
    push("Year", format_period(body.period));
    push("Radius", format_distance(body.radius));
    if body.day_length > 0 {
        push("Length of Day", format_period(body.day_length));
    }
    let atmosphere = if body.pressure == 0 {
        body.atmosphere.clone()
    } else {
        format!("{} {}", format_pressure(body.pressure), body.atmosphere)
    };
    push("Atmosphere", atmosphere);
    push("Temperature", format_temperature(body.temperature));

    if body.is_inhabited() {
        push("Population", body.population.to_string());
        push("Government", format!("{} ({})", body.government, body.law));
        push("Star Port", body.port.clone());
        push("Tech Level", body.tech_level.to_string());
    }
    rows
}

pub fn pane_id(id: BodyId) -> String {
    format!("planet-{}", id)
}

pub fn map_viewport_id(id: BodyId) -> String {
    format!("map-{}", id)
}

pub fn menu_id(star: StarId) -> String {
    format!("planet-menu-{}", star)
}

pub fn content_id(star: StarId) -> String {
    format!("planet-content-{}", star)
}

/// Navigation tab linking to the body's pane.
pub fn tab_html(body: &CelestialBody) -> String {
    format!(
        "<li class=\"nav-item\"><a class=\"nav-link\" data-toggle=\"tab\" id=\"{pane}-tab\" href=\"#{pane}\">{}</a></li>",
        escape_html(&body.name),
        pane = pane_id(body.id)
    )
}

pub fn pane_html(id: BodyId) -> String {
    format!("<div class=\"tab-pane fade\" id=\"{}\"></div>", pane_id(id))
}

/// Shown in place of content whose fetch failed.
pub fn placeholder_html(what: &str, reason: &str) -> String {
    format!(
        "<div class=\"alert alert-warning load-error\">Unable to load {}: {}</div>",
        escape_html(what),
        escape_html(reason)
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
