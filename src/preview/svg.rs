//! SVG serialization of a preview [`Scene`].
//!
//! The output is a standalone SVG document sized in CSS pixels. Text keeps
//! its whitespace (`xml:space="preserve"`) and the logo travels inline as a
//! data URL, so the document renders without touching the filesystem or
//! the network.

use std::fmt::Write as FmtWrite;

use quick_xml::escape::escape;

use super::{Anchor, Element, Scene, TextRun};

impl Scene {
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
             xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{w:.2}\" height=\"{h:.2}\" viewBox=\"0 0 {w:.2} {h:.2}\" \
             font-family=\"{family}\">\n",
            w = self.width,
            h = self.height,
            family = escape(self.font_family.css_stack()),
        );
        let _ = writeln!(
            out,
            "<rect x=\"0\" y=\"0\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
            self.width, self.height, self.background
        );

        for element in &self.elements {
            write_element(&mut out, element);
        }

        out.push_str("</svg>\n");
        out
    }
}

fn write_element(out: &mut String, element: &Element) {
    match element {
        Element::Rect {
            x,
            y,
            width,
            height,
            fill,
        } => {
            let _ = writeln!(
                out,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
                x, y, width, height, fill
            );
        }
        Element::Rule {
            x,
            y,
            width,
            thickness,
            color,
            opacity,
        } => {
            let _ = writeln!(
                out,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"{:.2}\"/>",
                x, y, width, thickness, color, opacity
            );
        }
        Element::Text(run) => write_text(out, run),
        Element::Image {
            x,
            y,
            width,
            height,
            href,
        } => {
            let _ = writeln!(
                out,
                "<image x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" \
                 preserveAspectRatio=\"xMidYMid meet\" xlink:href=\"{}\"/>",
                x,
                y,
                width,
                height,
                escape(href.as_str())
            );
        }
    }
}

fn write_text(out: &mut String, run: &TextRun) {
    if run.content.is_empty() {
        return;
    }
    let anchor = match run.anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    };
    let _ = write!(
        out,
        "<text xml:space=\"preserve\" x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.1}\" fill=\"{}\" text-anchor=\"{}\"",
        run.x, run.y, run.size, run.color, anchor
    );
    if run.bold {
        out.push_str(" font-weight=\"700\"");
    }
    if run.tracking > 0.0 {
        let _ = write!(out, " letter-spacing=\"{:.2}\"", run.tracking * run.size);
    }
    let _ = writeln!(out, ">{}</text>", escape(run.content.as_str()));
}
