use st_envsense::{Board, Config};

fn main() {
    env_logger::init();
    let mut board = Board::open(&Config::default()).expect("Couldn't open the sensors");
    let temp = board
        .temperature_from_humidity()
        .expect("Couldn't get temp");
    println!("It's {} on the humidity sensor", temp);
    let rh = board.humidity().expect("Couldn't get rh");
    println!("It's {} relative humidity", rh);
    loop {
        if let Some(temp) = board
            .temperature_from_pressure()
            .expect("Couldn't get temp")
            .ready()
        {
            println!("It's {} on the pressure sensor", temp);
        }
        if let Some(pressure) = board.pressure().expect("Couldn't get pressure").ready() {
            println!("The pressure is {}", pressure);
        }
        ::std::thread::sleep(::std::time::Duration::from_millis(250));
    }
}
