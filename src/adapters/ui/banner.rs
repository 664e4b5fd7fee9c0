//! Startup banner: "GEO-ATTEND" in figlet's standard font, shaded from top to bottom.

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{self, Write, stdout};
use tracing::debug;

const TITLE: &str = "GEO-ATTEND";
const TOP: Color = Color::Rgb {
    r: 0x1e,
    g: 0x5a,
    b: 0xff,
};
const BOTTOM: Color = Color::Rgb {
    r: 0x2e,
    g: 0xcc,
    b: 0x71,
};

/// Blend of `top` and `bottom` for row `row` out of `rows`. Non-RGB colors pass through.
fn shade(top: Color, bottom: Color, row: usize, rows: usize) -> Color {
    let (
        Color::Rgb {
            r: r0,
            g: g0,
            b: b0,
        },
        Color::Rgb {
            r: r1,
            g: g1,
            b: b1,
        },
    ) = (top, bottom)
    else {
        return top;
    };
    let t = if rows <= 1 {
        1.0
    } else {
        row as f64 / (rows - 1) as f64
    };
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    Color::Rgb {
        r: mix(r0, r1),
        g: mix(g0, g1),
        b: mix(b0, b1),
    }
}

/// Banner rows paired with their color. Plain title if the font fails to render.
fn banner_rows() -> Vec<(String, Color)> {
    let art = FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(TITLE).map(|figure| figure.to_string()))
        .unwrap_or_else(|| TITLE.to_string());
    let rows: Vec<&str> = art.lines().filter(|l| !l.trim().is_empty()).collect();
    let count = rows.len();
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| (row.to_string(), shade(TOP, BOTTOM, i, count)))
        .collect()
}

fn write_banner(out: &mut impl Write) -> io::Result<()> {
    for (row, color) in banner_rows() {
        queue!(out, SetForegroundColor(color), Print(row), Print("\r\n"))?;
    }
    queue!(
        out,
        SetForegroundColor(BOTTOM),
        Print(format!(
            "v{}  geofenced attendance\r\n",
            env!("CARGO_PKG_VERSION")
        )),
        ResetColor
    )?;
    out.flush()
}

/// Prints the welcome banner. A terminal write failure only costs the banner.
pub fn print_welcome() {
    if let Err(e) = write_banner(&mut stdout()) {
        debug!(error = %e, "banner not printed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shade_endpoints() {
        assert_eq!(shade(TOP, BOTTOM, 0, 5), TOP);
        assert_eq!(shade(TOP, BOTTOM, 4, 5), BOTTOM);
        assert_eq!(shade(TOP, BOTTOM, 0, 1), BOTTOM);
        assert_eq!(shade(Color::Reset, BOTTOM, 2, 5), Color::Reset);
    }

    #[test]
    fn test_banner_written_with_version() {
        let mut buf = Vec::new();
        write_banner(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
        assert!(banner_rows().len() > 1);
    }
}
