//! Polyline export of organ geometry.
//!
//! [`Plant::polylines`] is the read interface for consumers that want
//! absolute geometry; [`write_rsml`] serializes the whole tree as an
//! RSML-style document with laterals nested inside their parents.

use std::io::Write;

use glam::DVec3;

use crate::error::PlantError;
use crate::plant::{Plant, SEED};
use crate::types::{OrganFilter, OrganId, OrganKind};

/// Absolute geometry of one organ.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    pub organ: OrganId,
    pub kind: OrganKind,
    pub subtype: i32,
    pub points: Vec<DVec3>,
    /// Creation time of every point.
    pub times: Vec<f64>,
}

impl Polyline {
    /// Sum of the segment lengths.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

impl Plant {
    /// Polylines of the organs [`Plant::collect_organs`] yields for `filter`.
    pub fn polylines(&self, filter: OrganFilter) -> Vec<Polyline> {
        self.collect_organs(filter)
            .into_iter()
            .map(|id| {
                let organ = &self.organs[id];
                Polyline {
                    organ: id,
                    kind: organ.kind,
                    subtype: organ.param.subtype,
                    points: self.nodes(id),
                    times: organ.node_times.clone(),
                }
            })
            .collect()
    }
}

/// Writes the plant as an RSML document.
///
/// Every organ with more than one node becomes an element named after its
/// kind holding its polyline, a few properties and the `emergence_time`
/// function; its laterals follow nested inside it. Organs without
/// geometry are left out, their laterals are attached to the nearest
/// exported ancestor.
///
/// ### Returns
/// [`PlantError::Io`] if writing to `out` fails.
pub fn write_rsml<W: Write>(plant: &Plant, out: &mut W) -> Result<(), PlantError> {
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(out, "<rsml>")?;
    writeln!(out, "\t<metadata>")?;
    writeln!(out, "\t\t<version>1</version>")?;
    writeln!(out, "\t\t<unit>cm</unit>")?;
    writeln!(out, "\t\t<resolution>1</resolution>")?;
    writeln!(out, "\t\t<software>plant-core</software>")?;
    writeln!(out, "\t</metadata>")?;
    writeln!(out, "\t<scene>")?;
    writeln!(out, "\t\t<plant>")?;
    for &child in &plant.organ(SEED).children {
        write_organ(plant, child, out, "\t\t\t")?;
    }
    writeln!(out, "\t\t</plant>")?;
    writeln!(out, "\t</scene>")?;
    writeln!(out, "</rsml>")?;
    Ok(())
}

fn write_organ<W: Write>(
    plant: &Plant,
    id: OrganId,
    out: &mut W,
    indent: &str,
) -> Result<(), PlantError> {
    let organ = plant.organ(id);
    if organ.nodes.len() <= 1 {
        for &child in &organ.children {
            write_organ(plant, child, out, indent)?;
        }
        return Ok(());
    }

    let tag = organ.kind.name();
    let label = escape(&organ.template.name);
    writeln!(out, "{indent}<{tag} id=\"{id}\" label=\"{label}\">")?;

    writeln!(out, "{indent}\t<geometry>")?;
    writeln!(out, "{indent}\t\t<polyline>")?;
    for p in plant.nodes(id) {
        writeln!(out, "{indent}\t\t\t<point x=\"{}\" y=\"{}\" z=\"{}\"/>", p.x, p.y, p.z)?;
    }
    writeln!(out, "{indent}\t\t</polyline>")?;
    writeln!(out, "{indent}\t</geometry>")?;

    writeln!(out, "{indent}\t<properties>")?;
    writeln!(out, "{indent}\t\t<sub-type value=\"{}\"/>", organ.param.subtype)?;
    writeln!(out, "{indent}\t\t<parent-node value=\"{}\"/>", organ.parent_node_index)?;
    writeln!(out, "{indent}\t\t<length value=\"{}\"/>", organ.length)?;
    writeln!(out, "{indent}\t\t<age value=\"{}\"/>", organ.age)?;
    writeln!(out, "{indent}\t</properties>")?;

    writeln!(out, "{indent}\t<functions>")?;
    writeln!(out, "{indent}\t\t<function name=\"emergence_time\" domain=\"polyline\">")?;
    for t in &organ.node_times {
        writeln!(out, "{indent}\t\t\t<sample>{t}</sample>")?;
    }
    writeln!(out, "{indent}\t\t</function>")?;
    writeln!(out, "{indent}\t</functions>")?;

    let nested = format!("{indent}\t");
    for &child in &organ.children {
        write_organ(plant, child, out, &nested)?;
    }
    writeln!(out, "{indent}</{tag}>")?;
    Ok(())
}

/// Escapes the XML special characters of an attribute value.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
