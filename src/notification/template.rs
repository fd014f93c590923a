use chrono::{Datelike, Utc};

use super::EmailDeliveryRequest;

/// Render the booking confirmation HTML.
/// Field values are embedded verbatim.
pub fn confirmation_html(organization: &str, request: &EmailDeliveryRequest) -> String {
    let year = Utc::now().year();
    let EmailDeliveryRequest {
        name,
        email,
        phone,
        date,
        time,
        topic,
        message,
    } = request;

    format!(
        r#"
  <div style="font-family:'Segoe UI',Arial,sans-serif;background:#f8fafc;padding:40px;">
    <div style="max-width:600px;margin:auto;background:#fff;border-radius:10px;box-shadow:0 4px 15px rgba(0,0,0,0.08);overflow:hidden;">
      <div style="background:#375973;color:#fff;padding:20px;text-align:center;">
        <h1 style="margin:0;font-size:22px;">Booking Confirmation</h1>
      </div>
      <div style="padding:30px;">
        <p>Dear <strong>{name}</strong>,</p>
        <p>Thank you for reaching out to <strong>{organization}</strong>.</p>
        <p>We’ve received your booking request. One of our team members will contact you shortly to confirm your appointment details by phone.</p>

        <h3 style="color:#375973;margin-top:25px;">Booking Details</h3>
        <table style="width:100%;border-collapse:collapse;margin:10px 0;">
          <tr><td><strong>Name:</strong></td><td>{name}</td></tr>
          <tr><td><strong>Email:</strong></td><td>{email}</td></tr>
          <tr><td><strong>Phone:</strong></td><td>{phone}</td></tr>
          <tr><td><strong>Date:</strong></td><td>{date}</td></tr>
          <tr><td><strong>Time:</strong></td><td>{time}</td></tr>
          <tr><td><strong>Service:</strong></td><td>{topic}</td></tr>
          <tr><td><strong>Message:</strong></td><td>{message}</td></tr>
        </table>

        <p style="margin-top:20px;">We look forward to speaking with you soon!</p>
      </div>

      <div style="background:#f1f5f9;text-align:center;padding:12px;font-size:12px;color:#6b7280;">
        &copy; {year} {organization}. All rights reserved.
      </div>
    </div>
  </div>"#
    )
}
