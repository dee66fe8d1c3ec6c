// Example: content that arrives later, from a worker thread.
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use weekview::{Completion, DataSource, Event, Size, SourceError, WeekView, WeekViewOptions};

/// Answers every request with an empty day and hands the completion to a worker.
struct Remote {
    jobs: mpsc::Sender<(NaiveDate, Completion<Vec<Event>>)>,
}

impl DataSource for Remote {
    fn generate_events(
        &self,
        date: NaiveDate,
        completion: Completion<Vec<Event>>,
    ) -> Result<Option<Vec<Event>>, SourceError> {
        self.jobs
            .send((date, completion))
            .map_err(|_| SourceError::Unavailable("worker gone".into()))?;
        Ok(Some(Vec::new()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (jobs, queue) = mpsc::channel::<(NaiveDate, Completion<Vec<Event>>)>();
    let worker = thread::spawn(move || {
        for (date, completion) in queue {
            thread::sleep(Duration::from_millis(1));
            let (Some(start), Some(end)) = (date.and_hms_opt(11, 0, 0), date.and_hms_opt(12, 0, 0))
            else {
                continue;
            };
            if let Ok(event) = Event::new(format!("Sync {date}"), start, end) {
                completion.complete(vec![event]);
            }
        }
    });

    let start = NaiveDate::from_ymd_opt(2024, 3, 6).ok_or("bad date")?;
    let options = WeekViewOptions::new(Size::new(508.0, 500.0), start);
    let mut view = WeekView::new(options, Remote { jobs })?;

    // A host would drain once per frame.
    for frame in 0..20 {
        let summary = view.apply_completions();
        if !summary.is_empty() {
            println!("frame {frame}: {summary:?}");
        }
        thread::sleep(Duration::from_millis(2));
    }

    let laid_out = (0..15)
        .filter_map(|p| view.layout_for(p))
        .filter(|l| !l.is_empty())
        .count();
    println!("days with events: {laid_out}");

    drop(view);
    worker.join().map_err(|_| "worker panicked")?;
    Ok(())
}
