mod absence_check;

pub use absence_check::AbsenceCheckTask;
