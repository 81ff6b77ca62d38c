use skycast_services::{Dropdown, Screen};
use skycast_weather::Location;

pub fn banner() {
    println!("Weather Now");
    println!("Type a city name to search, :N to pick a result, :r to retry, :q to quit.");
}

pub fn help() {
    println!("  <text>   search for a city");
    println!("  :N       pick entry N from the list");
    println!("  :r       retry the last weather request");
    println!("  (empty)  show recent searches");
    println!("  :q       quit");
}

fn entries(locations: &[Location]) {
    for (i, location) in locations.iter().enumerate() {
        println!("  {}. {}  ({})", i + 1, location.name, location.area());
    }
}

pub fn dropdown(dropdown: &Dropdown) {
    match dropdown {
        Dropdown::Closed => {}
        Dropdown::Searching { .. } => println!("  Searching..."),
        Dropdown::Results { locations, .. } => entries(locations),
        Dropdown::NoResults { query } => println!("  No cities found for \"{}\"", query),
        Dropdown::Recent(locations) => {
            println!("  Recent searches");
            entries(locations);
        }
        Dropdown::EmptyPrompt => println!("  Start typing to search for a city"),
    }
}

pub fn screen(screen: &Screen) {
    match screen {
        Screen::Loading => println!("Getting weather data..."),
        Screen::Error { message } => {
            println!("Oops! Something went wrong");
            println!("{}  (:r to retry)", message);
        }
        Screen::Weather(view) => {
            println!();
            println!("{}", view.place);
            println!("{}", view.area);
            println!("{}  {}  [{}]", view.temperature, view.description, view.theme.name());
            println!(
                "Feels like {}  Humidity {}  Wind {}",
                view.feels_like, view.humidity, view.wind
            );
            println!("Last updated: {}", view.last_updated);
        }
        Screen::Welcome => {}
    }
}
