use crate::models::Booking;

pub const CSV_HEADER: &str = "id,date,timeSlot,serviceType,name,phone,email,address,notes,createdAt";

/// Renders bookings as CSV. Every field is quoted and embedded quotes are
/// doubled, so commas, quotes and newlines inside values survive.
pub fn bookings_csv(bookings: &[Booking]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for b in bookings {
        let fields = [
            b.id.to_string(),
            b.date.format("%Y-%m-%d").to_string(),
            b.time_slot.clone(),
            b.service_type.as_str().to_string(),
            b.name.clone(),
            b.phone.clone(),
            b.email.clone(),
            b.address.clone(),
            b.notes.clone(),
            b.created_at_string(),
        ];
        let row: Vec<String> = fields.iter().map(|v| quote(v)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
