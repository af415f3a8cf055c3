//! Train a small MLP on XOR and print the learning curve.

use std::time::Instant;

use ag_ndarray::{NDarray, NdResult};
use ag_nn::Chain;

fn main() {
    if let Err(err) = run() {
        eprintln!("training failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> NdResult<()> {
    println!("autograd multilayer network, XOR demo");

    let x = NDarray::from_vec(vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0], &[4, 2])?;
    let y = NDarray::from_vec(vec![0.0, 1.0, 1.0, 0.0], &[4, 1])?;

    let mlp = Chain::new(2, 123)
        .dense(4)
        .tanh()
        .dense(4)
        .tanh()
        .dense(1)
        .sigmoid();

    let epochs = 1000;
    let display_every = 100;
    let start = Instant::now();
    for epoch in 0..=epochs {
        mlp.forward(&x)?;
        let loss = mlp.loss(&y)?;
        if epoch % display_every == 0 {
            println!("epoch {epoch:5}/{epochs} loss {loss:.6}");
        }

        mlp.backward(&y)?;
        mlp.update_sgd(0.1)?;
        mlp.reset_gradients();
    }
    println!("time {:6} ms", start.elapsed().as_millis());

    println!();
    println!("prediction");
    println!("{}", mlp.predict(&x)?.round_to(3));
    Ok(())
}
