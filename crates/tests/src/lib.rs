#[cfg(test)]
mod common;

#[cfg(test)]
mod sheet_create_tests;

#[cfg(test)]
mod sheet_get_tests;

#[cfg(test)]
mod grade_update_tests;

#[cfg(test)]
mod bulk_update_tests;


#[cfg(test)]
mod gpa_tests;

#[cfg(test)]
mod auth_tests;

#[cfg(test)]
mod rate_limit_tests;

#[cfg(test)]
mod health_tests;
