use crate::model::user::BirthDate;
use serde::Deserialize;
use time::{Date, Month, UtcDateTime};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize)]
pub enum DateLocale {
    #[default]
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "en")]
    English,
}

/// Whole years between `birth` and `today`.
#[must_use]
pub fn age_on(birth: BirthDate, today: Date) -> i32 {
    let birth = birth.get();
    let age = today.year() - birth.year();

    let today_md = (u8::from(today.month()), today.day());
    let birth_md = (u8::from(birth.month()), birth.day());

    if today_md < birth_md { age - 1 } else { age }
}

#[must_use]
pub fn age_from_birth_date(birth: BirthDate) -> i32 {
    age_on(birth, UtcDateTime::now().date())
}

#[must_use]
pub fn format_birth_date(birth: BirthDate, locale: DateLocale) -> String {
    let (year, month, day) = birth.get().to_calendar_date();

    match locale {
        DateLocale::Spanish => format!("{day} de {} de {year}", spanish_month(month)),
        DateLocale::English => format!("{month} {day}, {year}"),
    }
}

fn spanish_month(month: Month) -> &'static str {
    match month {
        Month::January => "enero",
        Month::February => "febrero",
        Month::March => "marzo",
        Month::April => "abril",
        Month::May => "mayo",
        Month::June => "junio",
        Month::July => "julio",
        Month::August => "agosto",
        Month::September => "septiembre",
        Month::October => "octubre",
        Month::November => "noviembre",
        Month::December => "diciembre",
    }
}
