use criterion::{black_box, criterion_group, criterion_main, Criterion};

use keyscore_core::extract::parse_answer_key;

fn structured_page(grids: u32) -> String {
    let mut html = String::from(
        "<html><head><title>SSC CGL Answer Key</title></head><body>\
         <table><tr><td>Candidate Name</td><td>ASHA KUMARI</td></tr>\
         <tr><td>Roll Number</td><td>2405027590</td></tr>\
         <tr><td>Exam Date</td><td>15/12/2024</td></tr>\
         <tr><td>Exam Time</td><td>9:00 AM - 10:00 AM</td></tr>\
         <tr><td>Venue Name</td><td>iON Digital Zone, Noida</td></tr></table>",
    );
    for g in 0..grids {
        html.push_str("<table><tr><th>Q.No.</th><th>Your Answer</th><th>Correct Answer</th></tr>");
        for i in 1..=25 {
            let n = g * 25 + i;
            let user = ["A", "B", "C", "D", ""][(n % 5) as usize];
            let correct = ["A", "B", "C", "D"][(n % 4) as usize];
            html.push_str(&format!("<tr><td>{n}</td><td>{user}</td><td>{correct}</td></tr>"));
        }
        html.push_str("</table>");
    }
    html.push_str("</body></html>");
    html
}

fn view_source_dump(answers: u32) -> String {
    let mut out = String::from("<html><body><table>");
    out.push_str("<tr><td class=\"line-content\">&lt;td&gt;Candidate Name:&lt;/td&gt;&lt;td&gt;ASHA KUMARI&lt;/td&gt;</td></tr>");
    for n in 1..=answers {
        let user = ["A", "B", "C", "D"][(n % 4) as usize];
        let correct = ["A", "B", "C", "D"][(n % 3) as usize];
        out.push_str(&format!(
            "<tr><td class=\"line-content\">&lt;tr&gt;&lt;td&gt;{n}&lt;/td&gt;&lt;td&gt;{user}&lt;/td&gt;&lt;td&gt;{correct}&lt;/td&gt;&lt;/tr&gt;</td></tr>"
        ));
    }
    out.push_str("</table></body></html>");
    out
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    let small = structured_page(1);
    let full = structured_page(4);
    let no_grid = "<html><body><p>Roll Number: 2405027590</p></body></html>";
    let dump = view_source_dump(100);

    group.bench_function("structured/1_grid", |b| {
        b.iter(|| parse_answer_key(black_box(&small)))
    });

    group.bench_function("structured/4_grids", |b| {
        b.iter(|| parse_answer_key(black_box(&full)))
    });

    group.bench_function("synthetic_fallback", |b| {
        b.iter(|| parse_answer_key(black_box(no_grid)))
    });

    group.bench_function("view_source/100_answers", |b| {
        b.iter(|| parse_answer_key(black_box(&dump)))
    });

    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
