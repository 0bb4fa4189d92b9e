use resourcery_mutate::{Anchor, Applied, Mutation, MutationError, SourceDocument, rewrite};

const SEEDER: &str = r#"<?php

namespace Database\Seeders;

use Illuminate\Database\Console\Seeds\WithoutModelEvents;
use Illuminate\Database\Seeder;

class PostSeeder extends Seeder
{
    /**
     * Run the database seeds.
     */
    public function run(): void
    {
        //
    }
}
"#;

const MIGRATION: &str = r#"<?php

use Illuminate\Database\Migrations\Migration;
use Illuminate\Database\Schema\Blueprint;
use Illuminate\Support\Facades\Schema;

return new class extends Migration
{
    public function up(): void
    {
        Schema::create('posts', function (Blueprint $table) {
            $table->id();
            $table->timestamps();
        });
    }
};
"#;

#[test]
fn import_injection_is_idempotent() {
    let mut document = SourceDocument::parse(SEEDER);
    let mutation = Mutation::ensure_import(
        "App\\Models\\Post",
        Some("Illuminate\\Database\\Seeder"),
    );

    assert_eq!(document.apply(&mutation).expect("first apply"), Applied::Changed);
    assert_eq!(
        document.apply(&mutation).expect("second apply"),
        Applied::Unchanged
    );

    let rendered = document.render();
    assert_eq!(rendered.matches("use App\\Models\\Post;").count(), 1);
    assert!(rendered.contains("use Illuminate\\Database\\Seeder;\nuse App\\Models\\Post;\n"));
}

#[test]
fn block_body_replacement_keeps_surrounding_text() {
    let rewritten = rewrite(
        SEEDER,
        &[Mutation::replace_block_body(
            Anchor::loose("public function run(): void"),
            "\n        Post::factory()\n            ->count(10)\n            ->create();\n    ",
        )],
    )
    .expect("rewrite seeder");

    assert!(rewritten.contains(
        "public function run(): void\n    {\n        Post::factory()\n            ->count(10)\n            ->create();\n    }\n}\n"
    ));
    assert!(rewritten.contains("Run the database seeds."));
}

#[test]
fn replace_between_anchors() {
    let rewritten = rewrite(
        MIGRATION,
        &[Mutation::replace_between(
            Anchor::loose("$table->id();"),
            Anchor::loose("$table->timestamps();"),
            "\n            $table->string('title');\n            ",
        )],
    )
    .expect("rewrite migration");

    assert!(rewritten.contains(
        "$table->id();\n            $table->string('title');\n            $table->timestamps();"
    ));
}

#[test]
fn missing_anchor_is_reported() {
    let err = rewrite(
        SEEDER,
        &[Mutation::insert_after(
            Anchor::literal("use HasFactory;"),
            "\n",
        )],
    )
    .expect_err("anchor is absent");
    assert!(matches!(err, MutationError::AnchorNotFound(_)));
}

#[test]
fn no_op_rewrite_is_rejected() {
    let err = rewrite(
        SEEDER,
        &[Mutation::replace(
            Anchor::literal("extends Seeder"),
            "extends Seeder",
        )],
    )
    .expect_err("identical text");
    assert!(matches!(err, MutationError::NoOp(_)));
}

#[test]
fn append_to_class_lands_before_final_brace() {
    let rewritten = rewrite(
        SEEDER,
        &[Mutation::append_to_class(
            "\n\n    public function extra(): void\n    {\n    }",
        )],
    )
    .expect("append");
    assert!(rewritten.ends_with("    }\n\n    public function extra(): void\n    {\n    }\n}\n"));
}

#[test]
fn pattern_anchor_matches_trait_use() {
    let model = "<?php\n\nnamespace App\\Models;\n\nuse Illuminate\\Database\\Eloquent\\Model;\n\nclass Post extends Model\n{\n    use HasFactory, SoftDeletes;\n}\n";
    let anchor = Anchor::pattern(r"use\s+HasFactory[^;]*;").expect("valid pattern");
    let rewritten = rewrite(
        model,
        &[Mutation::insert_after(anchor, "\n\n    protected $fillable = [];")],
    )
    .expect("insert");
    assert!(rewritten.contains("use HasFactory, SoftDeletes;\n\n    protected $fillable = [];\n}"));
}
