//! Sample templates for testing and demonstration.
//!
//! They look like what the visual editor exports: full documents with an
//! inline `<style>` block and merge tags, or bare fragments.

/// Editor export of an invoice bound to the `Opportunity` object.
pub fn invoice_template() -> &'static str {
    r##"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<style type="text/css">
  body { font-family: Arial, sans-serif; color: #1a202c; }
  h1 { color: #1a365d; margin-bottom: 4px; }
  .muted { color: #718096; font-size: 12px; }
  .total { text-align: right; font-weight: bold; }
</style>
</head>
<body>
  <h1>Invoice {{Opportunity.Name}}</h1>
  <p class="muted">Issued {{Opportunity.CloseDate}}</p>

  <p>Bill to: <strong>{{Account.Name}}</strong><br>{{Account.BillingStreet}}<br>{{Account.BillingCity}}</p>

  <table width="100%">
    <tr><th>Item</th><th>Qty</th><th>Unit price</th><th>Total</th></tr>
    <tr><td>Implementation</td><td>40</td><td>$150.00</td><td>$6,000.00</td></tr>
    <tr><td>Training</td><td>8</td><td>$125.00</td><td>$1,000.00</td></tr>
    <tr><td>Support (annual)</td><td>1</td><td>$500.00</td><td>$500.00</td></tr>
  </table>

  <p class="total">Amount due: {{Opportunity.Amount}}</p>
</body>
</html>
"##
}

/// Letter fragment addressed to a `Contact`, with no document structure.
pub fn letter_template() -> &'static str {
    r##"<div style="font-family: Georgia, serif">
  <p>{{Contact.MailingCity}}, {{Contact.LastModifiedDate}}</p>
  <p>Dear {{Contact.FirstName}} {{Contact.LastName}},</p>
  <p>Thank you for choosing us. Your account manager is {{Contact.Owner}}.</p>
  <p>Kind regards,<br>The Team</p>
</div>"##
}

/// Table-heavy report that spans more than one page.
pub fn multi_page_template() -> String {
    let mut rows = String::new();
    for i in 1..=80 {
        rows.push_str(&format!(
            "<tr><td>Line {i}</td><td>{{{{Case.Subject}}}}</td><td>{}</td></tr>\n",
            i * 10
        ));
    }
    format!(
        "<html><head><style>h2 {{ margin: 0 0 8px; }}</style></head><body>\n<h2>Case report for {{{{Account.Name}}}}</h2>\n<table>\n<tr><th>#</th><th>Subject</th><th>Minutes</th></tr>\n{rows}</table>\n</body></html>\n"
    )
}

/// Minimal template for unit testing.
pub fn minimal_template() -> &'static str {
    "<table><tr><td>A</td></tr></table>"
}

/// Export with a broken style block and no closing body tag.
pub fn malformed_template() -> &'static str {
    "<html><head><style>td { color: red;</head><body><table><tr><td>{{Lead.Company}}</td></tr></table>"
}
