pub mod credit;
pub mod lesson;
pub mod session;
pub mod timeslot;
