use crate::model::{Schedule, Weekday};
use crate::repo::Repo;
use crate::store::KvStore;
use chrono::{Datelike, NaiveDate};

/// A class's periods, optionally for one weekday, in stored order.
///
/// Overlapping periods are returned as stored; nothing rejects double-booking.
pub fn schedules_for(
    store: &dyn KvStore,
    class_name: &str,
    weekday: Option<Weekday>,
) -> anyhow::Result<Vec<Schedule>> {
    Repo::<Schedule>::new(store)
        .find_by(|s| s.class_name == class_name && weekday.map_or(true, |w| s.weekday == w))
}

pub fn today_schedules(
    store: &dyn KvStore,
    class_name: &str,
    today: NaiveDate,
) -> anyhow::Result<Vec<Schedule>> {
    schedules_for(store, class_name, Some(today.weekday().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_defaults;
    use crate::store::MemoryStore;

    #[test]
    fn filters_by_class_and_weekday() {
        let store = MemoryStore::new();
        // 2026-10-19 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        seed_defaults(&store, monday).unwrap();
        assert_eq!(schedules_for(&store, "Kelas 10A", None).unwrap().len(), 19);
        let fri = schedules_for(&store, "Kelas 10A", Some(Weekday::Friday)).unwrap();
        assert_eq!(fri.len(), 3);
        let today = today_schedules(&store, "Kelas 10A", monday).unwrap();
        let ids: Vec<&str> = today.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["SCH001", "SCH002", "SCH003", "SCH004"]);
        let sunday = monday.pred_opt().unwrap();
        assert!(today_schedules(&store, "Kelas 10A", sunday).unwrap().is_empty());
        assert!(schedules_for(&store, "Kelas 12", None).unwrap().is_empty());
    }
}
