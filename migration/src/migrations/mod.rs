pub mod m202601120001_create_admins;
pub mod m202601120002_create_kids;
pub mod m202601120003_create_comics;
pub mod m202601120004_create_submissions;
