//! Visualization utilities for TSP tours.
//!
//! Two outputs: a Python turtle-graphics script that replays every accepted
//! improvement, and a static SVG drawing of a single tour.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
#[cfg(not(feature = "resvg"))]
use std::process::Command;

#[cfg(feature = "resvg")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "resvg")]
use resvg::usvg::{self, TreeParsing};
#[cfg(feature = "resvg")]
use resvg::{render, FitTo};

use crate::instance::{Instance, Point};
use crate::report::{Improvement, TourReporter};
use crate::solution::Tour;

/// Largest coordinate of a point set, rounded up, at least 1
pub fn extent(points: &[Point]) -> f64 {
    points
        .iter()
        .fold(1.0f64, |acc, p| acc.max(p.x).max(p.y))
        .ceil()
}

/// Writes a Python turtle script drawing each reported tour.
///
/// The header defines the world coordinates and one `p{i}` tuple per
/// vertex; every improvement appends a block that clears the canvas, draws
/// the tour and waits for the user. Write errors are kept and returned by
/// [`TurtleScript::finish`] so the search is never interrupted.
pub struct TurtleScript<W: Write> {
    writer: W,
    extent: f64,
    error: Option<io::Error>,
}

impl<W: Write> TurtleScript<W> {
    pub fn new(writer: W, points: &[Point], extent: f64) -> Self {
        let mut script = TurtleScript { writer, extent, error: None };
        let result = script.write_header(points);
        script.record(result);
        script
    }

    fn write_header(&mut self, points: &[Point]) -> io::Result<()> {
        writeln!(self.writer, "import turtle")?;
        writeln!(
            self.writer,
            "turtle.setworldcoordinates(0, 0, {}, {})",
            self.extent,
            self.extent + 100.0
        )?;
        for (i, p) in points.iter().enumerate() {
            writeln!(self.writer, "p{}=({},{})", i, p.x, p.y)?;
        }
        Ok(())
    }

    /// Append the drawing block for one tour
    pub fn draw(&mut self, tour: &[usize], cost: i64) -> io::Result<()> {
        let w = &mut self.writer;
        writeln!(w, "turtle.clear()")?;
        writeln!(w, "turtle.tracer(0,0)")?;
        writeln!(w, "turtle.penup()")?;
        writeln!(w, "turtle.goto(0,{})", self.extent + 50.0)?;
        writeln!(w, "turtle.write(\"Total length = {}\")", cost)?;
        writeln!(w, "turtle.speed(0)")?;
        if let Some(&first) = tour.first() {
            writeln!(w, "turtle.goto(p{})", first)?;
            writeln!(w, "turtle.pendown()")?;
            for &v in &tour[1..] {
                writeln!(w, "turtle.goto(p{})", v)?;
            }
            writeln!(w, "turtle.goto(p{})", first)?;
        }
        writeln!(w, "turtle.update()")?;
        writeln!(w, "wait = input(\"Enter return to continue\")")?;
        Ok(())
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if self.error.is_none() {
                log::warn!("turtle script output failed: {}", e);
                self.error = Some(e);
            }
        }
    }

    /// Flush and hand back the writer, or the first error met
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> TourReporter for TurtleScript<W> {
    fn report(&mut self, event: &Improvement<'_>) {
        if self.error.is_some() {
            return;
        }
        let result = self.draw(event.tour, event.cost);
        self.record(result);
    }
}

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Node radius
    pub node_radius: f64,
    /// Draw vertex indices next to the nodes
    pub labels: bool,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 4.0,
            labels: false,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG visualization of a tour
    pub fn generate_svg(&self, instance: &Instance, tour: &Tour) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(&instance.points);
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .node {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1; }}
    .start {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 1; }}
    .edge {{ stroke: #34495e; stroke-width: 2; fill: none; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Instance: {} | Vertices: {} | Length: {}</text>
"##,
            self.margin,
            instance.name,
            instance.dimension(),
            tour.cost
        ));

        let transform = |p: &Point| -> (f64, f64) {
            let tx = self.margin + (p.x - min_x) * scale;
            let ty = self.height - self.margin - (p.y - min_y) * scale;
            (tx, ty)
        };

        if tour.len() > 1 {
            let mut path = String::new();
            for (i, &v) in tour.order.iter().enumerate() {
                let (x, y) = transform(&instance.points[v]);
                let op = if i == 0 { "M" } else { " L" };
                path.push_str(&format!("{} {:.2} {:.2}", op, x, y));
            }
            path.push_str(" Z");
            svg.push_str(&format!(
                r##"<path d="{}" class="edge"/>
"##,
                path
            ));
        }

        for (i, p) in instance.points.iter().enumerate() {
            let (x, y) = transform(p);
            let class = if tour.order.first() == Some(&i) { "start" } else { "node" };
            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"##,
                x, y, self.node_radius, class
            ));
            if self.labels {
                svg.push_str(&format!(
                    r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                    x,
                    y - self.node_radius - 3.0,
                    i
                ));
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG, natively with the `resvg` feature, otherwise
    /// through `rsvg-convert` if it is installed.
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> io::Result<()> {
        let path = path.as_ref();

        #[cfg(feature = "resvg")]
        {
            let opt = usvg::Options::default();
            let tree = usvg::Tree::from_str(svg, &opt)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("usvg parse error: {}", e)))?;
            let mut pixmap = Pixmap::new(self.width as u32, self.height as u32)
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "failed to create pixmap"))?;
            render(&tree, FitTo::Original, Transform::default(), pixmap.as_mut())
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "resvg render failed"))?;
            pixmap
                .save_png(path)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("save_png failed: {}", e)))?;
            return Ok(());
        }

        #[cfg(not(feature = "resvg"))]
        {
            let tmp_svg = path.with_extension("svg.tmp");
            self.save_svg(svg, &tmp_svg)?;
            let status = Command::new("rsvg-convert")
                .arg("-o")
                .arg(path)
                .arg(&tmp_svg)
                .status();
            let _ = std::fs::remove_file(&tmp_svg);
            match status {
                Ok(s) if s.success() => Ok(()),
                _ => Err(io::Error::new(
                    io::ErrorKind::Other,
                    "no SVG->PNG converter succeeded (enable the `resvg` feature or install rsvg-convert)",
                )),
            }
        }
    }

    /// Get coordinate bounds
    fn get_bounds(&self, points: &[Point]) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        (min_x, max_x, min_y, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::CostMatrix;

    fn create_test_instance() -> Instance {
        let points = vec![Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(0.0, 4.0)];
        let matrix = CostMatrix::from_fn(3, |i, j| points[i].distance(&points[j]) as i64).unwrap();
        Instance {
            name: "test".to_string(),
            comment: String::new(),
            points,
            matrix,
        }
    }

    #[test]
    fn test_turtle_script_layout() {
        let instance = create_test_instance();
        let mut script = TurtleScript::new(Vec::new(), &instance.points, 1000.0);
        script.report(&Improvement { iteration: 2, cost: 12, tour: &[1, 0, 2] });
        let text = String::from_utf8(script.finish().unwrap()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "import turtle");
        assert_eq!(lines[1], "turtle.setworldcoordinates(0, 0, 1000, 1100)");
        assert_eq!(lines[2], "p0=(0,0)");
        assert_eq!(lines[3], "p1=(3,0)");
        assert!(text.contains("turtle.goto(0,1050)"));
        assert!(text.contains("turtle.write(\"Total length = 12\")"));
        assert!(text.contains("turtle.goto(p1)\nturtle.pendown()\nturtle.goto(p0)\nturtle.goto(p2)\nturtle.goto(p1)\n"));
        assert!(text.ends_with("wait = input(\"Enter return to continue\")\n"));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_turtle_script_keeps_first_error() {
        let instance = create_test_instance();
        let mut script = TurtleScript::new(FailingWriter, &instance.points, 10.0);
        script.report(&Improvement { iteration: 0, cost: 1, tour: &[0, 1, 2] });
        let err = script.finish().err().unwrap();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_extent() {
        assert_eq!(extent(&[Point::new(2.5, 997.2), Point::new(10.0, 3.0)]), 998.0);
        assert_eq!(extent(&[]), 1.0);
    }

    #[test]
    fn test_visualizer() {
        let instance = create_test_instance();
        let tour = Tour::from_order(vec![0, 1, 2], &instance.matrix);

        let viz = Visualizer::new();
        let svg = viz.generate_svg(&instance, &tour);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("Instance: test"));
        assert!(svg.contains(&format!("Length: {}", tour.cost)));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.ends_with("</svg>"));
    }
}
