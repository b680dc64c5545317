use crate::features::FeatureRecord;
use crate::io_struct::PredictResponse;
use crate::pipeline::Prediction;

/// Batch-shaped JSON document: output length always equals input length,
/// also for single-record requests.
pub fn json_response(predictions: &[Prediction]) -> PredictResponse {
    PredictResponse {
        classes: predictions.iter().map(|p| p.class_index).collect(),
        probabilities: predictions
            .iter()
            .map(|p| p.probabilities.clone())
            .collect(),
    }
}

/// Landing page with the input form, served on `GET /` and `GET /predict`.
pub fn landing_page() -> &'static str {
    r#"<!DOCTYPE html>
<html>
<head>
  <title>Housing Price-Segment Classifier</title>
  <style>
    body { font-family: -apple-system, "Segoe UI", sans-serif; background: #0f172a; color: #0f172a; margin: 0; }
    .wrapper { max-width: 860px; margin: 40px auto; display: grid; grid-template-columns: 1.1fr 1fr; gap: 24px; padding: 0 16px; }
    .card { background: #f9fafb; border-radius: 12px; padding: 24px 28px; }
    h1 { font-size: 24px; margin-top: 0; }
    p, li { color: #4b5563; font-size: 14px; }
    label { display: block; font-weight: 600; font-size: 13px; margin: 10px 0 4px; }
    input[type="number"] { width: 100%; padding: 8px 10px; border: 1px solid #d1d5db; border-radius: 8px; box-sizing: border-box; }
    button { margin-top: 14px; padding: 10px 18px; background: #2563eb; color: #fff; border: none; border-radius: 8px; cursor: pointer; }
    code { background: #e5e7eb; padding: 2px 4px; border-radius: 4px; font-size: 12px; }
  </style>
</head>
<body>
  <div class="wrapper">
    <div class="card">
      <h1>Housing price-segment classifier</h1>
      <p>Classifies a Melbourne property as <strong>Barata</strong>, <strong>Media</strong> or
         <strong>Cara</strong> from its physical and location features.</p>
      <ul>
        <li><strong>Rooms:</strong> number of rooms.</li>
        <li><strong>Distance:</strong> distance to the city center, in kilometers.</li>
        <li><strong>Bathroom:</strong> number of bathrooms.</li>
        <li><strong>Car:</strong> number of parking spaces.</li>
        <li><strong>Landsize:</strong> land size in square meters.</li>
      </ul>
      <p>The same service is available as a JSON API via <code>POST /predict</code>
         with <code>Content-Type: application/json</code>.</p>
    </div>
    <div class="card">
      <form method="POST" action="/predict">
        <label for="rooms">Rooms</label>
        <input id="rooms" type="number" name="Rooms" step="1" min="0" required>
        <label for="distance">Distance</label>
        <input id="distance" type="number" name="Distance" step="any" min="0" required>
        <label for="bathroom">Bathroom</label>
        <input id="bathroom" type="number" name="Bathroom" step="1" min="0" required>
        <label for="car">Car</label>
        <input id="car" type="number" name="Car" step="1" min="0" required>
        <label for="landsize">Landsize</label>
        <input id="landsize" type="number" name="Landsize" step="any" min="0" required>
        <button type="submit">Predict price segment</button>
      </form>
    </div>
  </div>
</body>
</html>
"#
}

/// Result page for the single-record form path: predicted label, numeric
/// class, the three probabilities to 3 decimal places, and the input echo.
pub fn result_page(record: &FeatureRecord, prediction: &Prediction) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Prediction result</title>
  <style>
    body {{ font-family: -apple-system, "Segoe UI", sans-serif; background: #0f172a; margin: 0; }}
    .card {{ max-width: 640px; margin: 40px auto; background: #f9fafb; border-radius: 12px; padding: 24px 28px; }}
    h1 {{ font-size: 22px; margin-top: 0; }}
    .legend {{ color: #6b7280; font-size: 12px; }}
    li {{ font-size: 14px; }}
    a {{ color: #2563eb; }}
  </style>
</head>
<body>
  <div class="card">
    <h1>Estimated price segment</h1>
    <p><strong>Predicted class:</strong> {label} (class {class})</p>
    <p class="legend">Barata (0) &middot; Media (1) &middot; Cara (2)</p>
    <h2>Per-class probabilities</h2>
    <ul>
      <li>Barata (0): {p0:.3}</li>
      <li>Media (1): {p1:.3}</li>
      <li>Cara (2): {p2:.3}</li>
    </ul>
    <h2>Submitted features</h2>
    <ul>
      <li>Rooms: {rooms:.0}</li>
      <li>Distance: {distance}</li>
      <li>Bathroom: {bathroom:.0}</li>
      <li>Car: {car:.0}</li>
      <li>Landsize: {landsize}</li>
    </ul>
    <p><a href="/predict">&larr; Make another prediction</a></p>
  </div>
</body>
</html>
"#,
        label = prediction.label,
        class = prediction.class_index,
        p0 = prediction.probabilities[0],
        p1 = prediction.probabilities[1],
        p2 = prediction.probabilities[2],
        rooms = record.rooms,
        distance = record.distance,
        bathroom = record.bathroom,
        car = record.car,
        landsize = record.landsize,
    )
}

/// Error page for failed form-mode requests.
pub fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Prediction error</title></head>
<body style="font-family: -apple-system, 'Segoe UI', sans-serif; background: #f4f5fb; margin: 0; padding: 20px;">
  <div style="max-width: 600px; margin: 40px auto; background: #ffffff; border-radius: 12px; padding: 24px 28px;">
    <h1>Prediction failed</h1>
    <p>{}</p>
    <p><a href="/predict" style="color: #2563eb;">Back to the form</a></p>
  </div>
</body>
</html>
"#,
        escape_html(message)
    )
}

/// Minimal HTML escaping for client-controlled text echoed into pages.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
