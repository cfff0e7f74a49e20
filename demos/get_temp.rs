use st_envsense::{Board, Config};

fn main() {
    env_logger::init();
    let path = std::env::args().nth(1).unwrap_or_else(|| "/dev/i2c-1".into());
    let mut board = Board::open(&Config::default().with_bus_path(path)).unwrap();
    let temp = board.temperature_from_humidity().unwrap();
    println!("It's {} on the humidity sensor", temp);
    let fahrenheit = board.humidity_chip().read_temperature_f().unwrap();
    println!("That's {:.1} F", fahrenheit);
}
