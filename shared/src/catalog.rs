//! Venue catalogs: the daily time-slot grid and the seating-zone list.
//!
//! Business configuration, not core logic. The dialog machine and the
//! availability checker reference these; nothing here touches the store.

/// First bookable hour of the day.
const OPENING_HOUR: u32 = 17;
/// Last hour that still has slots (the :30 slot of this hour is the final one).
const CLOSING_HOUR: u32 = 22;

/// Seating zones with capacity labels, as printed on guest keyboards.
pub const ZONES: [&str; 12] = [
    "Кабінка 1 (5-10 чол.)",
    "Кабінка 2 (до 8 чол.)",
    "Кабінка 3 (до 6 чол.)",
    "VIP Xbox X (до 12 чол.)",
    "VIP PS5 (до 12 чол.)",
    "Диванчики на барі (до 6 чол.)",
    "Барна стійка (6 місць)",
    "Літня тераса - стіл 1",
    "Літня тераса - стіл 2",
    "Літня тераса - стіл 3",
    "Літня тераса - стіл 4",
    "Додаткове місце на 3 чол.",
];

/// The half-hour slot grid within the opening window, `HH:MM` strings.
pub fn time_slots() -> Vec<String> {
    let mut slots = Vec::with_capacity(((CLOSING_HOUR - OPENING_HOUR + 1) * 2) as usize);
    for hour in OPENING_HOUR..=CLOSING_HOUR {
        for minute in [0, 30] {
            slots.push(format!("{hour:02}:{minute:02}"));
        }
    }
    slots
}

/// Whether a time string is one of the offered slots.
pub fn is_valid_slot(time: &str) -> bool {
    time_slots().iter().any(|s| s == time)
}

/// Zone label by catalog index, if in range.
pub fn zone_by_index(index: usize) -> Option<&'static str> {
    ZONES.get(index).copied()
}

/// Catalog index of a zone label, if present.
pub fn zone_index(zone: &str) -> Option<usize> {
    ZONES.iter().position(|z| *z == zone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_grid() {
        let slots = time_slots();
        assert_eq!(slots.len(), 12);
        assert_eq!(slots.first().unwrap(), "17:00");
        assert_eq!(slots.last().unwrap(), "22:30");
        assert!(slots.contains(&"19:30".to_string()));
    }

    #[test]
    fn test_slot_membership() {
        assert!(is_valid_slot("17:00"));
        assert!(is_valid_slot("22:30"));
        assert!(!is_valid_slot("23:00"));
        assert!(!is_valid_slot("17:15"));
        assert!(!is_valid_slot("1700"));
    }

    #[test]
    fn test_zone_index_round_trip() {
        for (i, zone) in ZONES.iter().enumerate() {
            assert_eq!(zone_by_index(i), Some(*zone));
            assert_eq!(zone_index(zone), Some(i));
        }
        assert_eq!(zone_by_index(ZONES.len()), None);
        assert_eq!(zone_index("Неіснуюча зона"), None);
    }
}
