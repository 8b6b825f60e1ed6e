//! Dashboard page: a static shell whose inline script polls `/data` and
//! plots both series on a canvas.

use alloc::string::String;
use core::fmt::Write;

use super::Snapshot;
use crate::display::PLACEHOLDER;

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>thermo</title>
<style>
body { font-family: sans-serif; margin: 1em; background: #111; color: #eee; }
canvas { width: 100%; max-width: 720px; height: 240px; background: #000; }
.t { color: #f66; } .h { color: #6cf; }
</style>
</head>
<body>
<h1>thermo</h1>
"#;

const SCRIPT: &str = r#"<canvas id="plot" width="720" height="240"></canvas>
<script>
function draw(series, color, ctx, w, h) {
  if (series.length < 2) return;
  const lo = Math.min(...series), hi = Math.max(...series);
  const span = hi - lo || 1;
  ctx.strokeStyle = color;
  ctx.beginPath();
  series.forEach((v, i) => {
    const x = i * w / (series.length - 1);
    const y = h - 8 - (v - lo) / span * (h - 16);
    if (i === 0) ctx.moveTo(x, y); else ctx.lineTo(x, y);
  });
  ctx.stroke();
}
async function poll() {
  try {
    const res = await fetch('/data?points=' + POINTS, { cache: 'no-store' });
    const data = await res.json();
    const canvas = document.getElementById('plot');
    const ctx = canvas.getContext('2d');
    ctx.clearRect(0, 0, canvas.width, canvas.height);
    draw(data.t, '#f66', ctx, canvas.width, canvas.height);
    draw(data.h, '#6cf', ctx, canvas.width, canvas.height);
    if (data.t.length) {
      document.getElementById('now').textContent =
        data.t[data.t.length - 1].toFixed(1) + '°C ' +
        data.h[data.h.length - 1].toFixed(1) + '%';
    }
  } catch (e) {}
}
poll();
setInterval(poll, POLL_MS);
</script>
</body>
</html>
"#;

pub fn dashboard_body(snapshot: &Snapshot<'_>) -> String {
    let mut body = String::from(HEAD);

    let _ = write!(body, "<p id=\"now\">");
    match snapshot.current {
        Some(reading) => {
            let _ = write!(body, "{}", reading);
        }
        None => body.push_str(PLACEHOLDER),
    }
    body.push_str("</p>\n<p><span class=\"t\">temperature</span> / <span class=\"h\">humidity</span>");
    let _ = write!(
        body,
        ", one point per {}</p>\n",
        snapshot.time_base.label_for_buckets(1)
    );

    let _ = write!(
        body,
        "<script>const POINTS = {}; const POLL_MS = {};</script>\n",
        snapshot.points.default, snapshot.dashboard_poll_ms
    );
    body.push_str(SCRIPT);
    body
}
